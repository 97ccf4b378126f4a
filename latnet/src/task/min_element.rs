//! Minimum-element scan with observer slots and cooperative abort.

use crate::types::Real;

/// Scans a merit sequence for its minimum, emitting start/visited/updated/
/// stop signals. Element-visited slots vote by logical AND: one false vote
/// aborts the scan and returns the argmin so far. A maximum accepted count
/// caps how many finite-merit candidates are examined.
pub struct MinElement {
    on_start: Vec<Box<dyn FnMut(usize)>>,
    on_stop: Vec<Box<dyn FnMut()>>,
    on_min_updated: Vec<Box<dyn FnMut(Real)>>,
    on_element_visited: Vec<Box<dyn FnMut(Real) -> bool>>,
    max_accepted_count: usize,
}

impl MinElement {
    pub fn new() -> Self {
        MinElement {
            on_start: Vec::new(),
            on_stop: Vec::new(),
            on_min_updated: Vec::new(),
            on_element_visited: Vec::new(),
            max_accepted_count: usize::MAX,
        }
    }

    pub fn on_start(&mut self, slot: impl FnMut(usize) + 'static) {
        self.on_start.push(Box::new(slot));
    }

    pub fn on_stop(&mut self, slot: impl FnMut() + 'static) {
        self.on_stop.push(Box::new(slot));
    }

    pub fn on_min_updated(&mut self, slot: impl FnMut(Real) + 'static) {
        self.on_min_updated.push(Box::new(slot));
    }

    pub fn on_element_visited(&mut self, slot: impl FnMut(Real) -> bool + 'static) {
        self.on_element_visited.push(Box::new(slot));
    }

    pub fn set_max_accepted_count(&mut self, count: usize) {
        self.max_accepted_count = count;
    }

    pub fn max_accepted_count(&self) -> usize {
        self.max_accepted_count
    }

    /// Returns the element with the lowest merit, or `None` on an empty
    /// sequence.
    pub fn run<T>(
        &mut self,
        items: impl Iterator<Item = (T, Real)>,
        total: usize,
    ) -> Option<(T, Real)> {
        for slot in &mut self.on_start {
            slot(total.min(self.max_accepted_count));
        }

        let mut best: Option<(T, Real)> = None;
        let mut accepted = 0usize;
        for (item, merit) in items {
            let improved = best.as_ref().map_or(true, |(_, m)| merit < *m);
            if improved {
                best = Some((item, merit));
                for slot in &mut self.on_min_updated {
                    slot(merit);
                }
            }
            if merit.is_finite() {
                accepted += 1;
            }
            let keep_going = self
                .on_element_visited
                .iter_mut()
                .fold(true, |acc, slot| acc & slot(merit));
            if !keep_going || accepted >= self.max_accepted_count {
                break;
            }
        }

        for slot in &mut self.on_stop {
            slot();
        }
        best
    }
}

impl Default for MinElement {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn finds_the_minimum() {
        let mut min = MinElement::new();
        let items = vec![("a", 3.0), ("b", 1.0), ("c", 2.0)];
        let best = min.run(items.into_iter(), 3).unwrap();
        assert_eq!(best, ("b", 1.0));
    }

    #[test]
    fn best_merit_bounds_all_observed() {
        let mut min = MinElement::new();
        let observed = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&observed);
        min.on_element_visited(move |m| {
            o.borrow_mut().push(m);
            true
        });
        let items: Vec<(usize, Real)> =
            (0..20).map(|i| (i, ((i * 7 + 3) % 11) as Real)).collect();
        let (_, best) = min.run(items.into_iter(), 20).unwrap();
        assert!(observed.borrow().iter().all(|&m| best <= m));
    }

    #[test]
    fn false_vote_aborts() {
        let mut min = MinElement::new();
        let mut visits = 0;
        let counter = Rc::new(RefCell::new(0usize));
        let c = Rc::clone(&counter);
        min.on_element_visited(move |_| {
            *c.borrow_mut() += 1;
            *c.borrow() < 3
        });
        let items = vec![(0, 5.0), (1, 4.0), (2, 3.0), (3, 2.0)];
        let best = min.run(items.into_iter(), 4).unwrap();
        visits += *counter.borrow();
        assert_eq!(visits, 3);
        assert_eq!(best, (2, 3.0));
    }

    #[test]
    fn accepted_count_caps_the_scan() {
        let mut min = MinElement::new();
        min.set_max_accepted_count(2);
        let items = vec![
            (0, Real::INFINITY), // rejected, does not count
            (1, 4.0),
            (2, 3.0),
            (3, 0.5), // never reached
        ];
        let best = min.run(items.into_iter(), 4).unwrap();
        assert_eq!(best, (2, 3.0));
    }

    #[test]
    fn signals_fire_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut min = MinElement::new();
        let l = Rc::clone(&log);
        min.on_start(move |n| l.borrow_mut().push(format!("start:{n}")));
        let l = Rc::clone(&log);
        min.on_min_updated(move |m| l.borrow_mut().push(format!("min:{m}")));
        let l = Rc::clone(&log);
        min.on_stop(move || l.borrow_mut().push("stop".into()));
        min.run(vec![((), 2.0), ((), 1.0), ((), 3.0)].into_iter(), 3);
        assert_eq!(
            *log.borrow(),
            vec!["start:3", "min:2", "min:1", "stop"]
        );
    }

    #[test]
    fn empty_sequence_yields_none() {
        let mut min = MinElement::new();
        assert!(min.run(std::iter::empty::<((), Real)>(), 0).is_none());
    }
}
