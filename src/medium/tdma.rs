use super::transmitter::Transmitter;

/// fixed-schedule transmitter: owns one slot out of every `period`.
pub struct Tdma {
    name: String,
    t: u64,
    period: u64,
    offset: u64,
}

impl Tdma {
    pub fn new(name: &str, period: u64, offset: u64) -> Self {
        assert!(period > 0, "{}: zero period", name);
        assert!(offset < period, "{}: offset {} beyond period {}", name, offset, period);
        Self {
            name: name.to_string(),
            t: 0,
            period,
            offset,
        }
    }
}

impl Transmitter for Tdma {
    fn transmit(&self) -> bool {
        self.t % self.period == self.offset
    }
    fn tick(&mut self) {
        self.t += 1;
    }
    fn name(&self) -> &str {
        &self.name
    }
}
