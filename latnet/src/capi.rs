//! C-linkable search entry points for ordinary lattices.
//!
//! Results are heap-allocated, returned by pointer and explicitly released;
//! errors are reported as a status code with a thread-local message string,
//! so a single-threaded caller always sees the last error.

use std::cell::RefCell;
use std::ffi::{c_char, c_int, CStr, CString};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};

use crate::figure::weighted::{PAlphaProjMerit, RAlphaProjMerit, WeightedFigureOfMerit};
use crate::figure::{CoordUniformFigureOfMerit, NormType};
use crate::filters::{
    Combiner, LowPass, MeritFilterList, MultilevelLowPass, MultilevelPAlphaNorm, PAlphaNorm,
};
use crate::kernel::{InterlacedA, InterlacedB, InterlacedC, Kernel, PAlpha, PAlphaPlr, RAlpha};
use crate::lat_def::LatDef;
use crate::lfsr258::Lfsr258;
use crate::merit_seq::{CoordUniformCbc, WeightedCbc};
use crate::size_param::SizeParam;
use crate::storage::Storage;
use crate::task::{
    cbc_search, exhaustive_per_coord, extend_per_coord, fast_cbc_search, random_cbc_search,
    weighted_cbc_search, Eval, LatSeq, LatSeqSearch, SearchResult,
};
use crate::types::{Integer, OrdinaryLattice, Real};
use crate::weights::{
    Coordinates, OrderDependentWeights, PodWeights, ProductWeights,
    ProjectionDependentWeights, Weights,
};

pub const LATNET_OK: c_int = 0;
pub const LATNET_ERROR: c_int = 1;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

fn set_error(message: &str) {
    let sanitized = message.replace('\0', " ");
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(sanitized).expect("NUL bytes stripped");
    });
}

/// Opaque result object handed across the C boundary.
#[allow(non_camel_case_types)]
pub struct latnet_result {
    inner: SearchResult,
}

/// Everything the driver construction needs, parsed from strings.
#[derive(Clone, Debug, Default)]
pub struct SearchSpec {
    pub construction: String,
    pub size: String,
    pub dimension: usize,
    pub norm_type: String,
    pub figure: String,
    pub weights: Vec<String>,
    pub weights_power: Real,
    pub filters: Vec<String>,
    pub multilevel_filters: Vec<String>,
    pub combiner: String,
    pub embedded: bool,
}

enum Construction {
    Exhaustive,
    Korobov,
    Random(usize),
    RandomKorobov(usize),
    Cbc,
    FastCbc,
    RandomCbc(usize),
    Extend { base_modulus: Integer, base_gen: Vec<Integer> },
    Eval { gen: Vec<Integer> },
}

fn parse_construction(spec: &str) -> Result<Construction> {
    let mut parts = spec.split(':');
    let head = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();
    let sample = |rest: &[&str]| -> Result<usize> {
        rest.first()
            .with_context(|| format!("{head} needs a random sample count"))?
            .parse()
            .with_context(|| format!("bad sample count in {spec}"))
    };
    match head {
        "exhaustive" => Ok(Construction::Exhaustive),
        "Korobov" | "korobov" => Ok(Construction::Korobov),
        "random" => Ok(Construction::Random(sample(&rest)?)),
        "random-Korobov" | "random-korobov" => Ok(Construction::RandomKorobov(sample(&rest)?)),
        "CBC" | "cbc" => Ok(Construction::Cbc),
        "fast-CBC" | "fast-cbc" => Ok(Construction::FastCbc),
        "random-CBC" | "random-cbc" => Ok(Construction::RandomCbc(sample(&rest)?)),
        "extend" => {
            let base_modulus = rest
                .first()
                .context("extend needs the base lattice size")?
                .parse()?;
            let base_gen = rest
                .get(1)
                .context("extend needs the base generating vector")?
                .split(',')
                .map(|t| t.trim().parse::<Integer>().map_err(Into::into))
                .collect::<Result<Vec<_>>>()?;
            Ok(Construction::Extend {
                base_modulus,
                base_gen,
            })
        }
        "evaluation" => {
            let gen = rest
                .first()
                .context("evaluation needs a generating vector")?
                .split(',')
                .map(|t| t.trim().parse::<Integer>().map_err(Into::into))
                .collect::<Result<Vec<_>>>()?;
            Ok(Construction::Eval { gen })
        }
        other => bail!("unknown construction: {other}"),
    }
}

fn parse_size(spec: &str, embedded: bool) -> Result<SizeParam<OrdinaryLattice>> {
    if let Some((base, level)) = spec.split_once('^') {
        let base: Integer = base.trim().parse().context("bad size base")?;
        let level: usize = level.trim().parse().context("bad size exponent")?;
        if embedded {
            return SizeParam::multilevel(base, level);
        }
        return SizeParam::unilevel(latnet_util::checked_pow(base, level as u32));
    }
    if embedded {
        bail!("embedded lattices need a size of the form base^maxLevel");
    }
    SizeParam::unilevel(spec.trim().parse().context("bad size")?)
}

fn parse_norm(spec: &str) -> Result<NormType> {
    if spec.trim() == "inf" {
        return Ok(NormType::Inf);
    }
    let q: Real = spec.trim().parse().context("bad norm type")?;
    if q < 1.0 {
        bail!("norm type must be inf or a real >= 1, got {q}");
    }
    Ok(NormType::Q(q))
}

fn parse_reals(spec: &str) -> Result<Vec<Real>> {
    spec.split(',')
        .map(|t| t.trim().parse::<Real>().map_err(Into::into))
        .collect()
}

fn parse_weights(specs: &[String]) -> Result<Weights> {
    let mut parsed = Vec::new();
    for spec in specs {
        let (kind, body) = spec
            .split_once(':')
            .with_context(|| format!("weights spec without a kind: {spec}"))?;
        match kind.trim() {
            "product" => {
                let values = parse_reals(body)?;
                parsed.push(if values.len() == 1 {
                    Weights::Product(ProductWeights::uniform(values[0]))
                } else {
                    Weights::Product(ProductWeights::with_coordinate_weights(values, 0.0))
                });
            }
            "order-dependent" | "order" => {
                parsed.push(Weights::OrderDependent(OrderDependentWeights::new(
                    parse_reals(body)?,
                    0.0,
                )));
            }
            "POD" | "pod" => {
                let (order, product) = body
                    .split_once(':')
                    .context("POD weights need order and product parts")?;
                parsed.push(Weights::Pod(PodWeights {
                    order: OrderDependentWeights::new(parse_reals(order)?, 0.0),
                    product: ProductWeights::with_coordinate_weights(parse_reals(product)?, 0.0),
                }));
            }
            "projection" => {
                // projection:{1,2}=0.7;{1,3}=0.5
                let mut weights = ProjectionDependentWeights::new();
                for entry in body.split(';') {
                    let (coords, gamma) = entry
                        .split_once('=')
                        .with_context(|| format!("bad projection weight: {entry}"))?;
                    let coords = coords.trim().trim_start_matches('{').trim_end_matches('}');
                    let projection: Coordinates = coords
                        .split(',')
                        .map(|t| -> Result<usize> {
                            let one_based: usize = t.trim().parse()?;
                            anyhow::ensure!(one_based >= 1, "coordinates are 1-based");
                            Ok(one_based - 1)
                        })
                        .collect::<Result<Vec<_>>>()?
                        .into_iter()
                        .collect();
                    weights.set_weight(projection, gamma.trim().parse()?);
                }
                parsed.push(Weights::ProjectionDependent(weights));
            }
            other => bail!("unknown weights kind: {other}"),
        }
    }
    match parsed.len() {
        0 => bail!("at least one weights spec is required"),
        1 => Ok(parsed.pop().expect("one element")),
        _ => Ok(Weights::Combined(parsed)),
    }
}

fn product_part(weights: &Weights) -> ProductWeights {
    match weights {
        Weights::Product(w) => w.clone(),
        Weights::Pod(w) => w.product.clone(),
        Weights::Combined(list) => list
            .iter()
            .find_map(|w| match w {
                Weights::Product(p) => Some(p.clone()),
                _ => None,
            })
            .unwrap_or_else(|| ProductWeights::uniform(1.0)),
        _ => ProductWeights::uniform(1.0),
    }
}

fn parse_filters(
    specs: &[String],
    weights: &Weights,
    list: &mut MeritFilterList<OrdinaryLattice>,
) -> Result<()> {
    for spec in specs {
        let (kind, body) = spec.split_once(':').unwrap_or((spec.as_str(), ""));
        match kind.trim() {
            "low-pass" => list.add(Box::new(LowPass::new(body.parse()?))),
            "norm" => {
                let alpha = body
                    .trim()
                    .strip_prefix('P')
                    .and_then(|a| a.split('-').next())
                    .with_context(|| format!("unknown norm: {body}"))?
                    .parse()?;
                list.add(Box::new(PAlphaNorm::new(alpha, product_part(weights))));
            }
            other => bail!("unknown filter: {other}"),
        }
    }
    Ok(())
}

fn parse_multilevel_filters(
    specs: &[String],
    weights: &Weights,
    max_level: usize,
    list: &mut MeritFilterList<OrdinaryLattice>,
) -> Result<()> {
    for spec in specs {
        let (kind, body) = spec.split_once(':').unwrap_or((spec.as_str(), ""));
        match kind.trim() {
            "low-pass" => list.add_multilevel(Box::new(MultilevelLowPass::new(body.parse()?))),
            "norm" => {
                let alpha = body
                    .trim()
                    .strip_prefix('P')
                    .and_then(|a| a.split('-').next())
                    .with_context(|| format!("unknown norm: {body}"))?
                    .parse()?;
                list.add_multilevel(Box::new(MultilevelPAlphaNorm::uniform(
                    alpha,
                    product_part(weights),
                    max_level,
                )));
            }
            other => bail!("unknown multilevel filter: {other}"),
        }
    }
    Ok(())
}

fn parse_combiner(spec: &str, max_level: usize) -> Result<Combiner> {
    match spec.trim() {
        "" | "sum" => Ok(Combiner::Sum),
        "max" => Ok(Combiner::Max),
        other => {
            let level = other
                .strip_prefix("level:")
                .with_context(|| format!("unknown combiner: {other}"))?;
            let level = if level == "max" {
                max_level
            } else {
                level.parse()?
            };
            Ok(Combiner::SelectLevel(level))
        }
    }
}

enum FigureSpec {
    WeightedPAlpha(u32),
    WeightedRAlpha(Real),
    CuPAlpha(u32),
    CuPAlphaPlr(u32),
    CuIb(u32),
    CuIc(u32, u32),
    CuIa(u32, u32),
}

fn parse_figure(spec: &str) -> Result<FigureSpec> {
    let parts: Vec<&str> = spec.split(':').collect();
    match parts.as_slice() {
        [one] => {
            if let Some(alpha) = one.strip_prefix('P') {
                Ok(FigureSpec::WeightedPAlpha(alpha.parse()?))
            } else if let Some(alpha) = one.strip_prefix('R') {
                Ok(FigureSpec::WeightedRAlpha(alpha.parse()?))
            } else {
                bail!("unknown figure: {spec}")
            }
        }
        ["CU", kernel] => {
            if let Some(alpha) = kernel.strip_prefix('P') {
                match alpha.strip_suffix("-PLR") {
                    Some(alpha) => Ok(FigureSpec::CuPAlphaPlr(alpha.parse()?)),
                    None => Ok(FigureSpec::CuPAlpha(alpha.parse()?)),
                }
            } else {
                bail!("unknown coordinate-uniform kernel: {kernel}")
            }
        }
        ["CU", "IB", d] => Ok(FigureSpec::CuIb(d.parse()?)),
        ["CU", "IC", alpha, d] => Ok(FigureSpec::CuIc(alpha.parse()?, d.parse()?)),
        ["CU", "IAIDN", alpha, d] => Ok(FigureSpec::CuIa(alpha.parse()?, d.parse()?)),
        _ => bail!("unknown figure: {spec}"),
    }
}

fn run_coord_uniform<K: Kernel>(
    kernel: K,
    construction: Construction,
    size: SizeParam<OrdinaryLattice>,
    dimension: usize,
    weights: Weights,
    weights_power: Real,
    filters: MeritFilterList<OrdinaryLattice>,
) -> Result<(LatDef<OrdinaryLattice>, Real)> {
    use crate::task::CandidateRules;
    let figure = CoordUniformFigureOfMerit::new(kernel, weights, weights_power);
    let compress = figure.suggested_compression();
    let engine = || -> Result<CoordUniformCbc<OrdinaryLattice>> {
        let storage = Storage::new(size, compress)?;
        CoordUniformCbc::new(storage, &figure)
    };
    let best = |lat: Option<&LatDef<OrdinaryLattice>>, merit: Option<Real>| {
        lat.cloned()
            .zip(merit)
            .ok_or_else(|| anyhow!("the search finished without selecting a lattice"))
    };
    match construction {
        Construction::Cbc => {
            let mut search = cbc_search(size, dimension, &figure, filters)?;
            search.execute()?;
            best(search.best_lattice(), search.best_merit_value())
        }
        Construction::FastCbc => {
            let mut search = fast_cbc_search(size, dimension, &figure, filters)?;
            search.execute()?;
            best(search.best_lattice(), search.best_merit_value())
        }
        Construction::RandomCbc(r) => {
            let mut search =
                random_cbc_search(size, dimension, &figure, filters, r, Lfsr258::default())?;
            search.execute()?;
            best(search.best_lattice(), search.best_merit_value())
        }
        Construction::Exhaustive => {
            let seq = LatSeq::Exhaustive {
                size,
                per_coord: exhaustive_per_coord(&size, dimension),
            };
            let mut search = LatSeqSearch::new(dimension, engine()?, seq, filters);
            search.execute()?;
            best(search.best_lattice(), search.best_merit_value())
        }
        Construction::Korobov => {
            let seq = LatSeq::Korobov {
                size,
                candidates: OrdinaryLattice::coprime_candidates(&size, compress),
                dimension,
            };
            let mut search = LatSeqSearch::new(dimension, engine()?, seq, filters);
            search.execute()?;
            best(search.best_lattice(), search.best_merit_value())
        }
        Construction::Random(r) => {
            let seq = LatSeq::Random {
                size,
                per_coord: exhaustive_per_coord(&size, dimension),
                count: r,
                rng: Lfsr258::default(),
            };
            let mut search = LatSeqSearch::new(dimension, engine()?, seq, filters);
            search.execute()?;
            best(search.best_lattice(), search.best_merit_value())
        }
        Construction::RandomKorobov(r) => {
            let seq = LatSeq::RandomKorobov {
                size,
                candidates: OrdinaryLattice::coprime_candidates(&size, compress),
                dimension,
                count: r,
                rng: Lfsr258::default(),
            };
            let mut search = LatSeqSearch::new(dimension, engine()?, seq, filters);
            search.execute()?;
            best(search.best_lattice(), search.best_merit_value())
        }
        Construction::Extend {
            base_modulus,
            base_gen,
        } => {
            anyhow::ensure!(
                base_gen.len() == dimension,
                "the base generating vector must have {dimension} coordinates"
            );
            let seq = LatSeq::Exhaustive {
                size,
                per_coord: extend_per_coord(size.num_points(), base_modulus, &base_gen)?,
            };
            let mut search = LatSeqSearch::new(dimension, engine()?, seq, filters);
            search.execute()?;
            best(search.best_lattice(), search.best_merit_value())
        }
        Construction::Eval { gen } => {
            anyhow::ensure!(
                gen.len() == dimension,
                "the generating vector must have {dimension} coordinates"
            );
            let mut eval = Eval::new(engine()?, filters);
            eval.execute(size, gen)
        }
    }
}

fn run_weighted(
    figure_spec: FigureSpec,
    construction: Construction,
    size: SizeParam<OrdinaryLattice>,
    dimension: usize,
    weights: Weights,
    weights_power: Real,
    norm: NormType,
    filters: MeritFilterList<OrdinaryLattice>,
) -> Result<(LatDef<OrdinaryLattice>, Real)> {
    anyhow::ensure!(
        size.max_level() == 0,
        "the projection-sum figures evaluate unilevel lattices; use a CU figure"
    );
    macro_rules! dispatch {
        ($merit:expr) => {{
            let figure = WeightedFigureOfMerit::new($merit, weights, weights_power, norm);
            match construction {
                Construction::Cbc => {
                    let mut search = weighted_cbc_search(size, dimension, figure, filters)?;
                    search.execute()?;
                    search
                        .best_lattice()
                        .cloned()
                        .zip(search.best_merit_value())
                        .ok_or_else(|| anyhow!("the search selected no lattice"))
                }
                Construction::Eval { gen } => {
                    anyhow::ensure!(
                        gen.len() == dimension,
                        "the generating vector must have {dimension} coordinates"
                    );
                    let engine = WeightedCbc::new(size, figure)?;
                    let mut eval = Eval::new(engine, filters);
                    eval.execute(size, gen)
                }
                Construction::Korobov => {
                    use crate::task::CandidateRules;
                    let engine = WeightedCbc::new(size, figure)?;
                    let seq = LatSeq::Korobov {
                        size,
                        candidates: OrdinaryLattice::coprime_candidates(
                            &size,
                            crate::storage::Compress::None,
                        ),
                        dimension,
                    };
                    let mut search = LatSeqSearch::new(dimension, engine, seq, filters);
                    search.execute()?;
                    search
                        .best_lattice()
                        .cloned()
                        .zip(search.best_merit_value())
                        .ok_or_else(|| anyhow!("the search selected no lattice"))
                }
                _ => bail!(
                    "this figure supports the CBC, Korobov and evaluation constructions"
                ),
            }
        }};
    }
    match figure_spec {
        FigureSpec::WeightedPAlpha(alpha) => dispatch!(PAlphaProjMerit::new(alpha)?),
        FigureSpec::WeightedRAlpha(alpha) => dispatch!(RAlphaProjMerit::new(alpha)?),
        _ => unreachable!("coordinate-uniform figures take the other path"),
    }
}

/// Runs a fully parsed search specification and stamps the wall time.
pub fn execute_search_spec(spec: &SearchSpec) -> Result<SearchResult> {
    anyhow::ensure!(spec.dimension >= 1, "dimension must be positive");
    let construction = parse_construction(&spec.construction)?;
    let size = parse_size(&spec.size, spec.embedded)?;
    let weights = parse_weights(&spec.weights)?;
    let norm = parse_norm(&spec.norm_type)?;
    let figure = parse_figure(&spec.figure)?;

    let mut filters = MeritFilterList::new();
    if spec.embedded {
        let combiner = parse_combiner(&spec.combiner, size.max_level())?;
        filters = MeritFilterList::with_combiner(combiner);
        parse_multilevel_filters(
            &spec.multilevel_filters,
            &weights,
            size.max_level(),
            &mut filters,
        )?;
    }
    parse_filters(&spec.filters, &weights, &mut filters)?;

    let started = Instant::now();
    let (lat, merit) = match figure {
        FigureSpec::CuPAlpha(alpha) => run_coord_uniform(
            PAlpha::new(alpha)?,
            construction,
            size,
            spec.dimension,
            weights,
            spec.weights_power,
            filters,
        )?,
        FigureSpec::CuPAlphaPlr(alpha) => run_coord_uniform(
            PAlphaPlr::new(alpha)?,
            construction,
            size,
            spec.dimension,
            weights,
            spec.weights_power,
            filters,
        )?,
        FigureSpec::CuIb(d) => run_coord_uniform(
            InterlacedB::new(d)?,
            construction,
            size,
            spec.dimension,
            weights,
            spec.weights_power,
            filters,
        )?,
        FigureSpec::CuIc(alpha, d) => run_coord_uniform(
            InterlacedC::new(alpha, d)?,
            construction,
            size,
            spec.dimension,
            weights,
            spec.weights_power,
            filters,
        )?,
        FigureSpec::CuIa(alpha, d) => run_coord_uniform(
            InterlacedA::new(alpha, d)?,
            construction,
            size,
            spec.dimension,
            weights,
            spec.weights_power,
            filters,
        )?,
        weighted => run_weighted(
            weighted,
            construction,
            size,
            spec.dimension,
            weights,
            spec.weights_power,
            norm,
            filters,
        )?,
    };
    let elapsed = started.elapsed().as_secs_f64();
    Ok(SearchResult::from_lattice(&lat, merit, elapsed))
}

unsafe fn cstr<'a>(ptr: *const c_char, what: &str) -> Result<&'a str> {
    anyhow::ensure!(!ptr.is_null(), "{what} is null");
    CStr::from_ptr(ptr)
        .to_str()
        .with_context(|| format!("{what} is not valid UTF-8"))
}

unsafe fn cstr_array(
    count: usize,
    ptr: *const *const c_char,
    what: &str,
) -> Result<Vec<String>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    anyhow::ensure!(!ptr.is_null(), "{what} array is null");
    (0..count)
        .map(|i| cstr(*ptr.add(i), what).map(str::to_owned))
        .collect()
}

unsafe fn search_str(
    construction: *const c_char,
    size: *const c_char,
    dimension: *const c_char,
    norm_type: *const c_char,
    figure: *const c_char,
    weight_count: usize,
    weights: *const *const c_char,
    weights_power: *const c_char,
    filter_count: usize,
    filters: *const *const c_char,
    multilevel_filter_count: usize,
    multilevel_filters: *const *const c_char,
    combiner: *const c_char,
    embedded: bool,
    result: *mut *mut latnet_result,
) -> Result<()> {
    anyhow::ensure!(!result.is_null(), "result pointer is null");
    let spec = SearchSpec {
        construction: cstr(construction, "construction")?.to_owned(),
        size: cstr(size, "size")?.to_owned(),
        dimension: cstr(dimension, "dimension")?.parse().context("bad dimension")?,
        norm_type: cstr(norm_type, "norm type")?.to_owned(),
        figure: cstr(figure, "figure")?.to_owned(),
        weights: cstr_array(weight_count, weights, "weights")?,
        weights_power: cstr(weights_power, "weights power")?
            .parse()
            .context("bad weights power")?,
        filters: cstr_array(filter_count, filters, "filters")?,
        multilevel_filters: cstr_array(
            multilevel_filter_count,
            multilevel_filters,
            "multilevel filters",
        )?,
        combiner: if combiner.is_null() {
            String::new()
        } else {
            cstr(combiner, "combiner")?.to_owned()
        },
        embedded,
    };
    let outcome = execute_search_spec(&spec)?;
    *result = Box::into_raw(Box::new(latnet_result { inner: outcome }));
    Ok(())
}

/// # Safety
/// All pointers must be valid NUL-terminated strings (arrays of them where
/// counts are given), and `result` must point to writable storage.
#[no_mangle]
pub unsafe extern "C" fn latnet_search_ordinary_str(
    construction: *const c_char,
    size: *const c_char,
    dimension: *const c_char,
    norm_type: *const c_char,
    figure: *const c_char,
    weight_count: usize,
    weights: *const *const c_char,
    weights_power: *const c_char,
    filter_count: usize,
    filters: *const *const c_char,
    result: *mut *mut latnet_result,
) -> c_int {
    match search_str(
        construction,
        size,
        dimension,
        norm_type,
        figure,
        weight_count,
        weights,
        weights_power,
        filter_count,
        filters,
        0,
        std::ptr::null(),
        std::ptr::null(),
        false,
        result,
    ) {
        Ok(()) => LATNET_OK,
        Err(e) => {
            set_error(&format!("{e:#}"));
            LATNET_ERROR
        }
    }
}

/// # Safety
/// See [`latnet_search_ordinary_str`].
#[no_mangle]
pub unsafe extern "C" fn latnet_search_embedded_str(
    construction: *const c_char,
    size: *const c_char,
    dimension: *const c_char,
    norm_type: *const c_char,
    figure: *const c_char,
    weight_count: usize,
    weights: *const *const c_char,
    weights_power: *const c_char,
    filter_count: usize,
    filters: *const *const c_char,
    multilevel_filter_count: usize,
    multilevel_filters: *const *const c_char,
    combiner: *const c_char,
    result: *mut *mut latnet_result,
) -> c_int {
    match search_str(
        construction,
        size,
        dimension,
        norm_type,
        figure,
        weight_count,
        weights,
        weights_power,
        filter_count,
        filters,
        multilevel_filter_count,
        multilevel_filters,
        combiner,
        true,
        result,
    ) {
        Ok(()) => LATNET_OK,
        Err(e) => {
            set_error(&format!("{e:#}"));
            LATNET_ERROR
        }
    }
}

/// # Safety
/// `result` must come from a successful search call, and must not be used
/// afterwards.
#[no_mangle]
pub unsafe extern "C" fn latnet_release_result(result: *mut latnet_result) {
    if !result.is_null() {
        drop(Box::from_raw(result));
    }
}

/// # Safety
/// `result` must be a live result object.
#[no_mangle]
pub unsafe extern "C" fn latnet_result_get_num_points(result: *const latnet_result) -> u64 {
    (*result).inner.num_points
}

/// # Safety
/// `result` must be a live result object.
#[no_mangle]
pub unsafe extern "C" fn latnet_result_get_dimension(result: *const latnet_result) -> usize {
    (*result).inner.dimension
}

/// # Safety
/// `result` must be a live result object; the pointer is valid until the
/// result is released.
#[no_mangle]
pub unsafe extern "C" fn latnet_result_get_gen(result: *const latnet_result) -> *const u64 {
    (*result).inner.gen.as_ptr()
}

/// # Safety
/// `result` must be a live result object.
#[no_mangle]
pub unsafe extern "C" fn latnet_result_get_merit(result: *const latnet_result) -> f64 {
    (*result).inner.merit
}

/// # Safety
/// `result` must be a live result object.
#[no_mangle]
pub unsafe extern "C" fn latnet_result_get_cpu_seconds(result: *const latnet_result) -> f64 {
    (*result).inner.cpu_seconds
}

/// The message of the last error on this thread; valid until the next
/// failing call.
#[no_mangle]
pub extern "C" fn latnet_get_error_string() -> *const c_char {
    LAST_ERROR.with(|e| e.borrow().as_ptr())
}
