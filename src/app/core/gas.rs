use crate::error::{codes, TxError};

/// Flat and per-byte costs of store access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasConfig {
    pub read_cost_flat: u64,
    pub read_cost_per_byte: u64,
    pub write_cost_flat: u64,
    pub write_cost_per_byte: u64,
}

pub const KV_GAS_CONFIG: GasConfig = GasConfig {
    read_cost_flat: 1000,
    read_cost_per_byte: 3,
    write_cost_flat: 2000,
    write_cost_per_byte: 30,
};

#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        GasMeter { limit, consumed: 0 }
    }

    /// A meter that never runs out; used for simulation.
    pub fn infinite() -> Self {
        Self::new(u64::MAX)
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Records `amount` even when it overflows the limit, so `consumed` reports what was attempted.
    ///
    /// Usage past `u64::MAX` is out of gas, even on an infinite meter.
    pub fn consume(&mut self, amount: u64, descriptor: &str) -> Result<(), TxError> {
        let (consumed, overflowed) = self.consumed.overflowing_add(amount);
        self.consumed = if overflowed { u64::MAX } else { consumed };
        if overflowed || self.consumed > self.limit {
            return Err(TxError::new(
                codes::OUT_OF_GAS,
                format!(
                    "out of gas in location: {}; gasWanted: {}, gasUsed: {}",
                    descriptor, self.limit, self.consumed
                ),
            ));
        }
        Ok(())
    }

    pub fn consume_read(&mut self, value_len: usize) -> Result<(), TxError> {
        let cost = KV_GAS_CONFIG
            .read_cost_per_byte
            .saturating_mul(value_len as u64)
            .saturating_add(KV_GAS_CONFIG.read_cost_flat);
        self.consume(cost, "ReadPerByte")
    }

    pub fn consume_write(&mut self, value_len: usize) -> Result<(), TxError> {
        let cost = KV_GAS_CONFIG
            .write_cost_per_byte
            .saturating_mul(value_len as u64)
            .saturating_add(KV_GAS_CONFIG.write_cost_flat);
        self.consume(cost, "WritePerByte")
    }
}
