//! Propagated logic constants from the external logic simulator: tie cells
//! and constant nets that were resolved before path generation.

use std::collections::HashMap;

use crate::network::PinId;
use crate::transition::LogicValue;

#[derive(Debug, Clone, Default)]
pub struct LogicSim {
    values: HashMap<PinId, LogicValue>,
}

impl LogicSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_logic_value(&mut self, pin: PinId, value: LogicValue) {
        self.values.insert(pin, value);
    }

    #[inline]
    pub fn logic_value(&self, pin: PinId) -> LogicValue {
        self.values
            .get(&pin)
            .copied()
            .unwrap_or(LogicValue::Unknown)
    }
}
