//! Fire sources.
//!
//! A fire instance (`&FIRE`) places a fire definition in a compartment. The
//! definition is keyed by `fire_id` and consists of a `&CHEM` composition
//! record, a `&TABL ... LABELS` header and one `&TABL ... DATA` record per
//! row of the time-series table. Several instances may share one definition.

use core::fmt;

use cf_core::{CoreError, CoreResult, Number, Record, RecordStyle, Value};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fields::{Checker, Fields, typed, unknown};
use crate::kinds::Criterion;
use crate::render::{card, join};
use crate::ModelResult;

/// One row of a fire's time-series table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FireRow {
    /// s.
    pub time: Number,
    /// Heat release rate, W.
    pub hrr: Number,
    /// Height of the fire base above the floor, m.
    pub height: Number,
    /// m².
    pub area: Number,
    pub co_yield: Number,
    pub soot_yield: Number,
    pub hcn_yield: Number,
    pub hcl_yield: Number,
    pub trace_yield: Number,
}

impl FireRow {
    /// Column labels in table order.
    pub const LABELS: [&'static str; 9] = [
        "TIME",
        "HRR",
        "HEIGHT",
        "AREA",
        "CO_YIELD",
        "SOOT_YIELD",
        "HCN_YIELD",
        "HCL_YIELD",
        "TRACE_YIELD",
    ];

    pub fn values(&self) -> [Number; 9] {
        [
            self.time,
            self.hrr,
            self.height,
            self.area,
            self.co_yield,
            self.soot_yield,
            self.hcn_yield,
            self.hcl_yield,
            self.trace_yield,
        ]
    }

    pub fn from_slice(values: &[Number]) -> CoreResult<Self> {
        let row: [Number; 9] = values.try_into().map_err(|_| CoreError::Arity {
            expected: 9,
            found: values.len(),
        })?;
        Ok(row.into())
    }
}

impl From<[Number; 9]> for FireRow {
    fn from(v: [Number; 9]) -> Self {
        let [
            time,
            hrr,
            height,
            area,
            co_yield,
            soot_yield,
            hcn_yield,
            hcl_yield,
            trace_yield,
        ] = v;
        Self {
            time,
            hrr,
            height,
            area,
            co_yield,
            soot_yield,
            hcn_yield,
            hcl_yield,
            trace_yield,
        }
    }
}

impl From<FireRow> for Value {
    fn from(row: FireRow) -> Self {
        row.values().into()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireParams {
    pub id: String,
    pub comp_id: String,
    /// Definition this instance uses.
    pub fire_id: String,
    /// Position in the compartment, m.
    pub location: [Number; 2],
    /// `None` ignites at time zero.
    pub ignition_criterion: Option<Criterion>,
    /// s, °C or kW/m² depending on the criterion.
    pub set_point: Option<Number>,
    pub device_id: Option<String>,
    pub carbon: Number,
    pub chlorine: Number,
    pub hydrogen: Number,
    pub nitrogen: Number,
    pub oxygen: Number,
    /// kJ/kg.
    pub heat_of_combustion: Number,
    pub radiative_fraction: Number,
    pub data_table: Vec<FireRow>,
}

impl Default for FireParams {
    fn default() -> Self {
        Self {
            id: String::new(),
            comp_id: String::new(),
            fire_id: String::new(),
            location: [Number::Int(0), Number::Int(0)],
            ignition_criterion: None,
            set_point: None,
            device_id: None,
            carbon: Number::Int(1),
            chlorine: Number::Int(0),
            hydrogen: Number::Int(4),
            nitrogen: Number::Int(0),
            oxygen: Number::Int(0),
            heat_of_combustion: Number::Int(50000),
            radiative_fraction: Number::Real(0.35),
            data_table: vec![FireRow::default()],
        }
    }
}

impl FireParams {
    pub fn new(
        id: impl Into<String>,
        comp_id: impl Into<String>,
        fire_id: impl Into<String>,
        location: [Number; 2],
    ) -> Self {
        Self {
            id: id.into(),
            comp_id: comp_id.into(),
            fire_id: fire_id.into(),
            location,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FireParams", into = "FireParams")]
pub struct Fire {
    params: FireParams,
}

validated_entity!(Fire, FireParams);

const FIELDS: &[&str] = &[
    "id",
    "comp_id",
    "fire_id",
    "location",
    "ignition_criterion",
    "set_point",
    "device_id",
    "carbon",
    "chlorine",
    "hydrogen",
    "nitrogen",
    "oxygen",
    "heat_of_combustion",
    "radiative_fraction",
    "data_table",
];

fn rows(value: &Value) -> CoreResult<Vec<FireRow>> {
    value
        .to_number_rows()?
        .iter()
        .map(|row| FireRow::from_slice(row))
        .collect()
}

impl Fire {
    fn validate(p: &FireParams) -> ModelResult<()> {
        let c = Checker::new(Self::ENTITY, &p.id);
        c.identifier("id", &p.id)?;
        c.identifier("comp_id", &p.comp_id)?;
        c.identifier("fire_id", &p.fire_id)?;
        c.all_finite("location", &p.location)?;
        for (field, n) in [
            ("carbon", p.carbon),
            ("chlorine", p.chlorine),
            ("hydrogen", p.hydrogen),
            ("nitrogen", p.nitrogen),
            ("oxygen", p.oxygen),
        ] {
            c.non_negative(field, n)?;
        }
        c.positive("heat_of_combustion", p.heat_of_combustion)?;
        c.fraction("radiative_fraction", p.radiative_fraction)?;
        if let Some(sp) = p.set_point {
            c.finite("set_point", sp)?;
        }
        if let Some(device) = &p.device_id {
            c.identifier("device_id", device)?;
        }
        if matches!(
            p.ignition_criterion,
            Some(Criterion::Temperature | Criterion::Flux)
        ) {
            c.ensure(p.set_point.is_some() && p.device_id.is_some(), || {
                "temperature and flux ignition need a set_point and a device_id".to_string()
            })?;
        }
        c.ensure(!p.data_table.is_empty(), || {
            "data_table needs at least one row".to_string()
        })?;
        for row in &p.data_table {
            c.all_finite("data_table", &row.values())?;
            for (label, n) in FireRow::LABELS.iter().zip(row.values()).skip(1) {
                c.ensure(n.as_f64() >= 0.0, || {
                    format!("{label} must not be negative (got {n})")
                })?;
            }
        }
        if let Some(pair) = p
            .data_table
            .windows(2)
            .find(|w| w[1].time.as_f64() < w[0].time.as_f64())
        {
            warn!(
                fire = %p.id,
                "fire table time goes backwards ({} then {})",
                pair[0].time,
                pair[1].time
            );
        }
        Ok(())
    }

    /// The `&FIRE` instance record.
    pub fn fire_record(&self) -> Record {
        let mut rec = Record::new("FIRE")
            .field("ID", &self.id)
            .field("COMP_ID", &self.comp_id)
            .field("FIRE_ID", &self.fire_id)
            .field("LOCATION", self.location);
        if let Some(criterion) = self.ignition_criterion {
            if criterion != Criterion::Time {
                rec.push("IGNITION_CRITERION", criterion.key());
            }
            rec.push("DEVC_ID", self.device_id.clone());
            rec.push("SETPOINT", self.set_point);
        }
        rec
    }

    /// `&CHEM`, the `&TABL` labels header and one `&TABL` per data row.
    pub fn definition_records(&self) -> Vec<Record> {
        let mut recs = Vec::with_capacity(self.data_table.len() + 2);
        recs.push(
            Record::new("CHEM")
                .field("ID", &self.fire_id)
                .field("CARBON", self.carbon)
                .field("CHLORINE", self.chlorine)
                .field("HYDROGEN", self.hydrogen)
                .field("NITROGEN", self.nitrogen)
                .field("OXYGEN", self.oxygen)
                .field("HEAT_OF_COMBUSTION", self.heat_of_combustion)
                .field("RADIATIVE_FRACTION", self.radiative_fraction),
        );
        recs.push(
            Record::new("TABL")
                .field("ID", &self.fire_id)
                .field("LABELS", FireRow::LABELS),
        );
        for row in &self.data_table {
            recs.push(
                Record::new("TABL")
                    .field("ID", &self.fire_id)
                    .field("DATA", *row),
            );
        }
        recs
    }

    /// True when both instances carry the same definition. Numbers compare
    /// by value, so `1` and `1.0` agree.
    pub fn same_definition(&self, other: &Fire) -> bool {
        let (a, b) = (&self.params, &other.params);
        let same = |x: Number, y: Number| x.as_f64() == y.as_f64();
        a.fire_id == b.fire_id
            && same(a.carbon, b.carbon)
            && same(a.chlorine, b.chlorine)
            && same(a.hydrogen, b.hydrogen)
            && same(a.nitrogen, b.nitrogen)
            && same(a.oxygen, b.oxygen)
            && same(a.heat_of_combustion, b.heat_of_combustion)
            && same(a.radiative_fraction, b.radiative_fraction)
            && a.data_table.len() == b.data_table.len()
            && a.data_table.iter().zip(&b.data_table).all(|(r, q)| {
                r.values().into_iter().zip(q.values()).all(|(x, y)| same(x, y))
            })
    }

    /// Copies composition and table from another instance, keeping this
    /// instance's placement and trigger.
    pub fn adopt_definition(&mut self, from: &Fire) -> ModelResult<()> {
        let src = &from.params;
        self.modify(|p| {
            p.carbon = src.carbon;
            p.chlorine = src.chlorine;
            p.hydrogen = src.hydrogen;
            p.nitrogen = src.nitrogen;
            p.oxygen = src.oxygen;
            p.heat_of_combustion = src.heat_of_combustion;
            p.radiative_fraction = src.radiative_fraction;
            p.data_table = src.data_table.clone();
        })
    }

    pub fn records(&self) -> Vec<Record> {
        let mut recs = vec![self.fire_record()];
        recs.extend(self.definition_records());
        recs
    }

    pub fn to_input_string(&self) -> String {
        self.records()
            .iter()
            .map(|r| r.render(RecordStyle::Compact))
            .collect()
    }

    /// Largest heat release rate in the table, W.
    pub fn peak_hrr(&self) -> f64 {
        self.data_table
            .iter()
            .map(|r| r.hrr.as_f64())
            .fold(0.0, f64::max)
    }

    pub fn to_html(&self) -> String {
        let mut rows = vec![
            ("Compartment", self.comp_id.clone()),
            ("Definition", self.fire_id.clone()),
            ("Location", format!("{} m", join(&self.location))),
            ("Peak HRR", format!("{} kW", self.peak_hrr() / 1000.0)),
            ("Table rows", self.data_table.len().to_string()),
        ];
        if let Some(criterion) = self.ignition_criterion {
            rows.push(("Ignition", criterion.to_string()));
        }
        card("Fire", &self.id, &rows)
    }
}

impl Fields for Fire {
    const ENTITY: &'static str = "Fire";

    fn field_names(&self) -> &'static [&'static str] {
        FIELDS
    }

    fn get(&self, key: &str) -> ModelResult<Value> {
        let p = &self.params;
        Ok(match key {
            "id" => p.id.clone().into(),
            "comp_id" => p.comp_id.clone().into(),
            "fire_id" => p.fire_id.clone().into(),
            "location" => p.location.into(),
            "ignition_criterion" => p.ignition_criterion.map(|c| c.key()).into(),
            "set_point" => p.set_point.into(),
            "device_id" => p.device_id.clone().into(),
            "carbon" => p.carbon.into(),
            "chlorine" => p.chlorine.into(),
            "hydrogen" => p.hydrogen.into(),
            "nitrogen" => p.nitrogen.into(),
            "oxygen" => p.oxygen.into(),
            "heat_of_combustion" => p.heat_of_combustion.into(),
            "radiative_fraction" => p.radiative_fraction.into(),
            "data_table" => p.data_table.clone().into(),
            _ => return Err(unknown(Self::ENTITY, key)),
        })
    }

    fn assign(&mut self, key: &str, value: Value) -> ModelResult<()> {
        let e = Self::ENTITY;
        let p = &mut self.params;
        match key {
            "id" => p.id = typed(e, key, value.to_text())?,
            "comp_id" => p.comp_id = typed(e, key, value.to_text())?,
            "fire_id" => p.fire_id = typed(e, key, value.to_text())?,
            "location" => p.location = typed(e, key, value.to_number_array())?,
            "ignition_criterion" => {
                p.ignition_criterion =
                    typed(e, key, value.optional(Value::to_keyword::<Criterion>))?
            }
            "set_point" => p.set_point = typed(e, key, value.optional(Value::to_number))?,
            "device_id" => p.device_id = typed(e, key, value.optional(Value::to_text))?,
            "carbon" => p.carbon = typed(e, key, value.to_number())?,
            "chlorine" => p.chlorine = typed(e, key, value.to_number())?,
            "hydrogen" => p.hydrogen = typed(e, key, value.to_number())?,
            "nitrogen" => p.nitrogen = typed(e, key, value.to_number())?,
            "oxygen" => p.oxygen = typed(e, key, value.to_number())?,
            "heat_of_combustion" => p.heat_of_combustion = typed(e, key, value.to_number())?,
            "radiative_fraction" => p.radiative_fraction = typed(e, key, value.to_number())?,
            "data_table" => p.data_table = typed(e, key, rows(&value))?,
            _ => return Err(unknown(e, key)),
        }
        Ok(())
    }

    fn check(&self) -> ModelResult<()> {
        Self::validate(&self.params)
    }
}

impl fmt::Display for Fire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fire '{}' in {} ({}): peak {} kW, {} table rows",
            self.id,
            self.comp_id,
            self.fire_id,
            self.peak_hrr() / 1000.0,
            self.data_table.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelError;

    fn row(time: i64, hrr: i64) -> FireRow {
        FireRow {
            time: time.into(),
            hrr: hrr.into(),
            ..FireRow::default()
        }
    }

    fn fire() -> Fire {
        Fire::new(FireParams {
            data_table: vec![row(0, 0), row(60, 100000)],
            ..FireParams::new("F1", "ROOM1", "WOOD", Number::array([1.0, 1.5]))
        })
        .unwrap()
    }

    #[test]
    fn records_share_the_definition_id() {
        let text = fire().to_input_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "&FIRE ID = 'F1' COMP_ID = 'ROOM1' FIRE_ID = 'WOOD' LOCATION = 1.0, 1.5 /"
        );
        assert_eq!(
            lines[1],
            "&CHEM ID = 'WOOD' CARBON = 1 CHLORINE = 0 HYDROGEN = 4 NITROGEN = 0 OXYGEN = 0 \
             HEAT_OF_COMBUSTION = 50000 RADIATIVE_FRACTION = 0.35 /"
        );
        assert!(lines[2].starts_with("&TABL ID = 'WOOD' LABELS = 'TIME', 'HRR', 'HEIGHT'"));
        assert_eq!(lines[3], "&TABL ID = 'WOOD' DATA = 0, 0, 0, 0, 0, 0, 0, 0, 0 /");
        assert_eq!(
            lines[4],
            "&TABL ID = 'WOOD' DATA = 60, 100000, 0, 0, 0, 0, 0, 0, 0 /"
        );
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn time_criterion_is_implicit() {
        let mut f = fire();
        f.set_many([
            ("ignition_criterion", Value::from("TIME")),
            ("set_point", Value::from(30)),
        ])
        .unwrap();
        let rec = f.fire_record();
        assert!(rec.get("IGNITION_CRITERION").is_none());
        assert_eq!(rec.get("SETPOINT"), Some(&Value::from(30)));
    }

    #[test]
    fn temperature_ignition_needs_a_device() {
        let mut f = fire();
        let err = f
            .set_many([
                ("ignition_criterion", Value::from("TEMPERATURE")),
                ("set_point", Value::from(200)),
            ])
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { .. }));
        assert_eq!(f.ignition_criterion, None);

        f.set_many([
            ("ignition_criterion", Value::from("TEMPERATURE")),
            ("set_point", Value::from(200)),
            ("device_id", Value::from("TRG")),
        ])
        .unwrap();
        assert!(f.to_input_string().contains(
            "IGNITION_CRITERION = 'TEMPERATURE' DEVC_ID = 'TRG' SETPOINT = 200 /"
        ));
    }

    #[test]
    fn data_table_rows_have_nine_columns() {
        let mut f = fire();
        let before = f.clone();
        let short = Value::from(vec![Value::from(vec![0, 1, 2])]);
        let err = f.set("data_table", short).unwrap_err();
        assert!(matches!(err, ModelError::InvalidType { .. }));
        assert!(f.set("data_table", Vec::<Value>::new()).is_err());
        assert_eq!(f, before);

        let table = Value::from(vec![
            Value::from(vec![0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Value::from(vec![10, 500, 0, 1, 0, 0, 0, 0, 0]),
        ]);
        f.set("data_table", table.clone()).unwrap();
        assert_eq!(f.get("data_table").unwrap(), table);
    }

    #[test]
    fn backwards_time_is_accepted() {
        let params = FireParams {
            data_table: vec![row(60, 0), row(0, 0)],
            ..FireParams::new("F2", "ROOM1", "WOOD", Number::array([0, 0]))
        };
        assert!(Fire::new(params).is_ok());
    }

    #[test]
    fn negative_yield_rejected() {
        let mut f = fire();
        let mut bad = f.data_table.clone();
        bad[1].soot_yield = Number::Real(-0.1);
        assert!(f.modify(|p| p.data_table = bad).is_err());
        assert_eq!(f.data_table[1].soot_yield, Number::Int(0));
    }

    #[test]
    fn shared_definitions() {
        let a = fire();
        let mut b = fire();
        b.set("id", "F2").unwrap();
        assert!(a.same_definition(&b));
        b.set("heat_of_combustion", 18000).unwrap();
        assert!(!a.same_definition(&b));
    }

    #[test]
    fn definitions_compare_by_value() {
        let a = fire();
        let mut b = fire();
        b.set("id", "F2").unwrap();
        let carbon = a.carbon.as_f64();
        b.set("carbon", Number::Real(carbon)).unwrap();
        let mut table = b.data_table.clone();
        table[0].hrr = Number::Real(table[0].hrr.as_f64());
        b.modify(|p| p.data_table = table).unwrap();
        assert!(a.same_definition(&b));

        b.adopt_definition(&a).unwrap();
        assert_eq!(b.carbon, a.carbon);
        assert_eq!(b.id, "F2");
    }
}
