use rand::Rng;
use rand::rngs::SmallRng;
use std::collections::BTreeSet;
use std::collections::VecDeque;

/// bounded FIFO of recent slot tags, used to estimate the active
/// population. a used slot records the winner's name, an empty slot
/// records nothing, and a collision records a fresh random token so
/// that unidentifiable transmitters still count as distinct.
pub struct ParticipantCounter {
    bound: usize,
    queue: VecDeque<Option<String>>,
}

impl ParticipantCounter {
    pub fn new(bound: usize) -> Self {
        Self {
            bound,
            queue: VecDeque::new(),
        }
    }

    /// a collision happened: somebody unnamed is out there
    pub fn hit(&mut self, rng: &mut SmallRng) {
        self.queue
            .push_front(Some(format!("{:x}", rng.random::<u32>())));
        self.normalize();
    }

    /// the slot resolved to `name`, or to nobody
    pub fn set(&mut self, name: Option<&str>) {
        self.queue.push_front(name.map(String::from));
        self.normalize();
    }

    /// distinct non-null tags currently in the window
    pub fn count(&self) -> usize {
        self.queue
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<&str>>()
            .len()
    }

    /// there is at least one player: the node itself
    pub fn estimate(&self) -> usize {
        self.count().max(1)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn normalize(&mut self) {
        if self.queue.len() > self.bound {
            self.queue.pop_back();
        }
    }
}
