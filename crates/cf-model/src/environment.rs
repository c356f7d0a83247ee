//! Global run settings: title, timing, initial conditions.

use core::fmt;

use cf_core::{Number, Record, RecordStyle, Value};
use serde::{Deserialize, Serialize};

use crate::fields::{Checker, Fields, typed, unknown};
use crate::render::card;
use crate::ModelResult;

/// Input format version written to `&HEAD`.
pub const DECK_VERSION: i64 = 7700;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationEnvironmentParams {
    pub title: String,
    /// Simulated time, s.
    pub time_simulation: Number,
    /// Text output interval, s.
    pub print: Number,
    /// Visualization output interval, s.
    pub smokeview: Number,
    /// Spreadsheet output interval, s.
    pub spreadsheet: Number,
    /// Pa.
    pub init_pressure: Number,
    /// Percent.
    pub relative_humidity: Number,
    /// °C.
    pub interior_temperature: Number,
    /// °C.
    pub exterior_temperature: Number,
    pub adiabatic: Option<bool>,
    pub max_time_step: Option<Number>,
    pub lower_oxygen_limit: Option<Number>,
    /// `&DIAG` records written after the scenario records, one per line.
    pub extra_custom: Option<String>,
}

impl Default for SimulationEnvironmentParams {
    fn default() -> Self {
        Self {
            title: String::new(),
            time_simulation: Number::Int(900),
            print: Number::Int(60),
            smokeview: Number::Int(15),
            spreadsheet: Number::Int(15),
            init_pressure: Number::Int(101325),
            relative_humidity: Number::Int(50),
            interior_temperature: Number::Int(20),
            exterior_temperature: Number::Int(20),
            adiabatic: None,
            max_time_step: None,
            lower_oxygen_limit: None,
            extra_custom: None,
        }
    }
}

impl SimulationEnvironmentParams {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// A complete `&DIAG ... /` record on one line: nothing after the closing
/// slash, no comment, no second record.
fn is_diag_record(line: &str) -> bool {
    let Some(body) = line
        .get(..5)
        .filter(|k| k.eq_ignore_ascii_case("&DIAG"))
        .map(|_| &line[5..])
    else {
        return false;
    };
    if !(body.starts_with(char::is_whitespace) || body.starts_with('/')) {
        return false;
    }
    let mut quote = None;
    let mut closed = false;
    for ch in body.chars() {
        if closed {
            return false;
        }
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '/' => closed = true,
                '&' | '!' => return false,
                _ => {}
            },
        }
    }
    closed
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimulationEnvironmentParams", into = "SimulationEnvironmentParams")]
pub struct SimulationEnvironment {
    params: SimulationEnvironmentParams,
}

validated_entity!(SimulationEnvironment, SimulationEnvironmentParams);

const FIELDS: &[&str] = &[
    "title",
    "time_simulation",
    "print",
    "smokeview",
    "spreadsheet",
    "init_pressure",
    "relative_humidity",
    "interior_temperature",
    "exterior_temperature",
    "adiabatic",
    "max_time_step",
    "lower_oxygen_limit",
    "extra_custom",
];

impl SimulationEnvironment {
    /// Baseline settings with the given title.
    pub fn with_title(title: impl Into<String>) -> ModelResult<Self> {
        Self::new(SimulationEnvironmentParams::new(title))
    }

    fn validate(p: &SimulationEnvironmentParams) -> ModelResult<()> {
        let c = Checker::new(Self::ENTITY, &p.title);
        c.ensure(!p.title.contains(['\n', '\r']), || {
            "title must be a single line".to_string()
        })?;
        c.positive("time_simulation", p.time_simulation)?;
        c.non_negative("print", p.print)?;
        c.non_negative("smokeview", p.smokeview)?;
        c.non_negative("spreadsheet", p.spreadsheet)?;
        c.positive("init_pressure", p.init_pressure)?;
        let rh = c.finite("relative_humidity", p.relative_humidity)?;
        c.ensure((0.0..=100.0).contains(&rh), || {
            format!("relative_humidity must be between 0 and 100 (got {rh})")
        })?;
        c.finite("interior_temperature", p.interior_temperature)?;
        c.finite("exterior_temperature", p.exterior_temperature)?;
        if let Some(dt) = p.max_time_step {
            c.positive("max_time_step", dt)?;
        }
        if let Some(o2) = p.lower_oxygen_limit {
            c.non_negative("lower_oxygen_limit", o2)?;
        }
        if let Some(extra) = &p.extra_custom {
            for line in extra.lines().map(str::trim).filter(|l| !l.is_empty()) {
                c.ensure(is_diag_record(line), || {
                    format!("extra directive must be one &DIAG record per line: {line}")
                })?;
            }
        }
        Ok(())
    }

    /// `&MISC` is written only when it carries something.
    fn needs_misc(&self) -> bool {
        self.adiabatic == Some(true)
            || self.max_time_step.is_some()
            || self.lower_oxygen_limit.is_some()
    }

    pub fn head_record(&self) -> Record {
        Record::new("HEAD")
            .field("VERSION", DECK_VERSION)
            .field("TITLE", &self.title)
    }

    /// `&TIME`, `&INIT` and, when needed, `&MISC`.
    pub fn scenario_records(&self) -> Vec<Record> {
        let mut records = vec![
            Record::new("TIME")
                .field("SIMULATION", self.time_simulation)
                .field("PRINT", self.print)
                .field("SMOKEVIEW", self.smokeview)
                .field("SPREADSHEET", self.spreadsheet),
            Record::new("INIT")
                .field("PRESSURE", self.init_pressure)
                .field("RELATIVE_HUMIDITY", self.relative_humidity)
                .field("INTERIOR_TEMPERATURE", self.interior_temperature)
                .field("EXTERIOR_TEMPERATURE", self.exterior_temperature),
        ];
        if self.needs_misc() {
            records.push(
                Record::new("MISC")
                    .field("ADIABATIC", self.adiabatic)
                    .field("MAX_TIME_STEP", self.max_time_step)
                    .field("LOWER_OXYGEN_LIMIT", self.lower_oxygen_limit),
            );
        }
        records
    }

    /// The scenario block that opens every deck.
    pub fn render(&self, style: RecordStyle) -> String {
        let mut out = self.head_record().render(style);
        out.push_str("\n!! Scenario Configuration \n");
        for record in self.scenario_records() {
            out.push_str(&record.render(style));
        }
        if let Some(extra) = &self.extra_custom {
            for line in extra.lines().map(str::trim).filter(|l| !l.is_empty()) {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    pub fn to_input_string(&self) -> String {
        self.render(RecordStyle::Compact)
    }

    pub fn to_html(&self) -> String {
        card(
            "Simulation",
            &self.title,
            &[
                ("Duration", format!("{} s", self.time_simulation)),
                (
                    "Output intervals",
                    format!(
                        "print {} s, smokeview {} s, spreadsheet {} s",
                        self.print, self.smokeview, self.spreadsheet
                    ),
                ),
                (
                    "Initial conditions",
                    format!(
                        "{} Pa, {} % RH, {} °C inside, {} °C outside",
                        self.init_pressure,
                        self.relative_humidity,
                        self.interior_temperature,
                        self.exterior_temperature
                    ),
                ),
            ],
        )
    }
}

impl Fields for SimulationEnvironment {
    const ENTITY: &'static str = "SimulationEnvironment";

    fn field_names(&self) -> &'static [&'static str] {
        FIELDS
    }

    fn get(&self, key: &str) -> ModelResult<Value> {
        let p = &self.params;
        Ok(match key {
            "title" => p.title.clone().into(),
            "time_simulation" => p.time_simulation.into(),
            "print" => p.print.into(),
            "smokeview" => p.smokeview.into(),
            "spreadsheet" => p.spreadsheet.into(),
            "init_pressure" => p.init_pressure.into(),
            "relative_humidity" => p.relative_humidity.into(),
            "interior_temperature" => p.interior_temperature.into(),
            "exterior_temperature" => p.exterior_temperature.into(),
            "adiabatic" => p.adiabatic.into(),
            "max_time_step" => p.max_time_step.into(),
            "lower_oxygen_limit" => p.lower_oxygen_limit.into(),
            "extra_custom" => p.extra_custom.clone().into(),
            _ => return Err(unknown(Self::ENTITY, key)),
        })
    }

    fn assign(&mut self, key: &str, value: Value) -> ModelResult<()> {
        let e = Self::ENTITY;
        let p = &mut self.params;
        match key {
            "title" => p.title = typed(e, key, value.to_text())?,
            "time_simulation" => p.time_simulation = typed(e, key, value.to_number())?,
            "print" => p.print = typed(e, key, value.to_number())?,
            "smokeview" => p.smokeview = typed(e, key, value.to_number())?,
            "spreadsheet" => p.spreadsheet = typed(e, key, value.to_number())?,
            "init_pressure" => p.init_pressure = typed(e, key, value.to_number())?,
            "relative_humidity" => p.relative_humidity = typed(e, key, value.to_number())?,
            "interior_temperature" => p.interior_temperature = typed(e, key, value.to_number())?,
            "exterior_temperature" => p.exterior_temperature = typed(e, key, value.to_number())?,
            "adiabatic" => p.adiabatic = typed(e, key, value.optional(Value::to_bool))?,
            "max_time_step" => p.max_time_step = typed(e, key, value.optional(Value::to_number))?,
            "lower_oxygen_limit" => {
                p.lower_oxygen_limit = typed(e, key, value.optional(Value::to_number))?
            }
            "extra_custom" => p.extra_custom = typed(e, key, value.optional(Value::to_text))?,
            _ => return Err(unknown(e, key)),
        }
        Ok(())
    }

    fn check(&self) -> ModelResult<()> {
        Self::validate(&self.params)
    }
}

impl fmt::Display for SimulationEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Simulation '{}': {} s, output every {} s, {} °C interior, {} °C exterior",
            self.title,
            self.time_simulation,
            self.print,
            self.interior_temperature,
            self.exterior_temperature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> SimulationEnvironment {
        SimulationEnvironment::new(SimulationEnvironmentParams {
            time_simulation: Number::Int(1800),
            print: Number::Int(30),
            smokeview: Number::Int(10),
            spreadsheet: Number::Int(10),
            ..SimulationEnvironmentParams::new("T")
        })
        .unwrap()
    }

    #[test]
    fn time_record_layout() {
        let records = env().scenario_records();
        assert_eq!(
            records[0].to_string(),
            "&TIME SIMULATION = 1800 PRINT = 30 SMOKEVIEW = 10 SPREADSHEET = 10 /"
        );
    }

    #[test]
    fn block_layout_without_misc() {
        let text = env().to_input_string();
        assert!(text.starts_with("&HEAD VERSION = 7700 TITLE = 'T' /\n\n!! Scenario Configuration \n&TIME"));
        assert!(text.contains(
            "&INIT PRESSURE = 101325 RELATIVE_HUMIDITY = 50 INTERIOR_TEMPERATURE = 20 EXTERIOR_TEMPERATURE = 20 /\n"
        ));
        assert!(!text.contains("&MISC"));
    }

    #[test]
    fn misc_only_when_set() {
        let mut e = env();
        e.set("adiabatic", false).unwrap();
        assert!(!e.to_input_string().contains("&MISC"));
        e.set("lower_oxygen_limit", 0.15).unwrap();
        assert!(e.to_input_string().contains("&MISC ADIABATIC = .FALSE. LOWER_OXYGEN_LIMIT = 0.15 /"));
    }

    #[test]
    fn extra_directives_follow_misc() {
        let mut e = env();
        e.set("extra_custom", "&DIAG RADSOLVER = 'DEFAULT' /").unwrap();
        assert!(e.to_input_string().ends_with("&DIAG RADSOLVER = 'DEFAULT' /\n"));
    }

    #[test]
    fn extra_directives_are_diag_records() {
        let mut e = env();
        for ok in [
            "&DIAG RADSOLVER = 'DEFAULT' /",
            "&diag A = 'x/y!' /\n\n  &DIAG B = 1 /  ",
            "&DIAG /",
        ] {
            e.set("extra_custom", ok).unwrap();
        }
        assert!(e.to_input_string().ends_with("&diag A = 'x/y!' /\n&DIAG B = 1 /\n"));
        for bad in [
            "!! keep me",
            "&XYZZY A = 1 /",
            "&DIAGNOSE A = 1 /",
            "&DIAG A = 1",
            "&DIAG A = 1 / &DIAG B = 2 /",
            "&DIAG A = 1 ! note /",
            "&DIAG A = 'open /",
        ] {
            assert!(e.set("extra_custom", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn rejected_write_keeps_state() {
        let mut e = env();
        let before = e.clone();
        assert!(e.set("relative_humidity", 150).is_err());
        assert!(e.set("time_simulation", "long").is_err());
        assert!(e.set("extra_custom", "free text").is_err());
        assert_eq!(e, before);
    }

    #[test]
    fn unknown_key_names_entity() {
        let err = env().get("duration").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("SimulationEnvironment"));
        assert!(msg.contains("duration"));
    }
}
