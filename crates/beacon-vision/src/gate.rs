/// Frame-rate limiter for the detector: admits one frame out of every `n`,
/// starting with the first one it sees.
#[derive(Debug, Clone)]
pub struct FrameGate {
    every_n: u32,
    counter: u32,
    seen: u64,
    admitted: u64,
}

impl FrameGate {
    pub fn new(every_n: u32) -> Self {
        Self { every_n: every_n.max(1), counter: 0, seen: 0, admitted: 0 }
    }

    pub fn admit(&mut self) -> bool {
        let pass = self.counter == 0;
        self.counter = (self.counter + 1) % self.every_n;
        self.seen += 1;
        if pass { self.admitted += 1; }
        pass
    }

    pub fn seen(&self) -> u64 { self.seen }
    pub fn admitted(&self) -> u64 { self.admitted }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_every_third_frame() {
        let mut g = FrameGate::new(3);
        let pattern: Vec<bool> = (0..7).map(|_| g.admit()).collect();
        assert_eq!(pattern, [true, false, false, true, false, false, true]);
        assert_eq!(g.seen(), 7);
        assert_eq!(g.admitted(), 3);
    }

    #[test]
    fn zero_is_treated_as_every_frame() {
        let mut g = FrameGate::new(0);
        assert!((0..4).all(|_| g.admit()));
    }
}
