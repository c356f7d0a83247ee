//! Open/close control shared by all vent kinds.

use cf_core::{Number, Record, Value};
use serde::{Deserialize, Serialize};

use crate::fields::{Checker, typed};
use crate::kinds::Criterion;
use crate::ModelResult;

pub(crate) const CONTROL_FIELDS: [&str; 7] = [
    "open_close_criterion",
    "set_point",
    "device_id",
    "pre_fraction",
    "post_fraction",
    "time",
    "fraction",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VentControl {
    pub open_close_criterion: Option<Criterion>,
    /// °C for temperature, kW/m² for flux.
    pub set_point: Option<Number>,
    /// Target whose reading drives the criterion.
    pub device_id: Option<String>,
    pub pre_fraction: Number,
    pub post_fraction: Number,
    /// Schedule times, s.
    pub time: Option<Vec<Number>>,
    /// Open fraction at each schedule time.
    pub fraction: Option<Vec<Number>>,
}

impl Default for VentControl {
    fn default() -> Self {
        Self {
            open_close_criterion: None,
            set_point: None,
            device_id: None,
            pre_fraction: Number::Int(1),
            post_fraction: Number::Int(1),
            time: None,
            fraction: None,
        }
    }
}

impl VentControl {
    /// Opening follows a time schedule.
    pub fn schedule(time: Vec<Number>, fraction: Vec<Number>) -> Self {
        Self {
            open_close_criterion: Some(Criterion::Time),
            time: Some(time),
            fraction: Some(fraction),
            ..Self::default()
        }
    }

    pub(crate) fn check(&self, c: &Checker<'_>) -> ModelResult<()> {
        match (&self.time, &self.fraction) {
            (None, None) => {}
            (Some(time), Some(fraction)) => {
                c.ensure(time.len() == fraction.len(), || {
                    format!(
                        "time and fraction lists must be of equal length ({} vs {})",
                        time.len(),
                        fraction.len()
                    )
                })?;
                c.all_finite("time", time)?;
                for f in fraction {
                    c.fraction("fraction", *f)?;
                }
            }
            _ => return Err(c.fail("time and fraction must be given together")),
        }
        c.fraction("pre_fraction", self.pre_fraction)?;
        c.fraction("post_fraction", self.post_fraction)?;
        if let Some(device) = &self.device_id {
            c.identifier("device_id", device)?;
        }
        if let Some(sp) = self.set_point {
            c.finite("set_point", sp)?;
        }
        if matches!(
            self.open_close_criterion,
            Some(Criterion::Temperature | Criterion::Flux)
        ) {
            c.ensure(self.set_point.is_some() && self.device_id.is_some(), || {
                "temperature and flux criteria need a set_point and a device_id".to_string()
            })?;
        }
        Ok(())
    }

    /// Criterion block followed by the schedule.
    pub(crate) fn push_fields(&self, rec: &mut Record) {
        if let Some(criterion) = self.open_close_criterion {
            rec.push("CRITERION", criterion.key());
            rec.push("SETPOINT", self.set_point);
            rec.push("DEVC_ID", self.device_id.clone());
            rec.push("PRE_FRACTION", self.pre_fraction);
            rec.push("POST_FRACTION", self.post_fraction);
        }
        rec.push("T", self.time.clone());
        rec.push("F", self.fraction.clone());
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        Some(match key {
            "open_close_criterion" => self.open_close_criterion.map(|c| c.key()).into(),
            "set_point" => self.set_point.into(),
            "device_id" => self.device_id.clone().into(),
            "pre_fraction" => self.pre_fraction.into(),
            "post_fraction" => self.post_fraction.into(),
            "time" => self.time.clone().into(),
            "fraction" => self.fraction.clone().into(),
            _ => return None,
        })
    }

    /// `None` when `key` is not a control field.
    pub(crate) fn assign(
        &mut self,
        entity: &'static str,
        key: &str,
        value: &Value,
    ) -> Option<ModelResult<()>> {
        let result = match key {
            "open_close_criterion" => typed(entity, key, value.optional(Value::to_keyword::<Criterion>))
                .map(|v| self.open_close_criterion = v),
            "set_point" => typed(entity, key, value.optional(Value::to_number))
                .map(|v| self.set_point = v),
            "device_id" => typed(entity, key, value.optional(Value::to_text))
                .map(|v| self.device_id = v),
            "pre_fraction" => typed(entity, key, value.to_number()).map(|v| self.pre_fraction = v),
            "post_fraction" => typed(entity, key, value.to_number()).map(|v| self.post_fraction = v),
            "time" => typed(entity, key, value.optional(Value::to_numbers)).map(|v| self.time = v),
            "fraction" => {
                typed(entity, key, value.optional(Value::to_numbers)).map(|v| self.fraction = v)
            }
            _ => return None,
        };
        Some(result)
    }
}
