//! Surface materials referenced by compartments and targets.

use core::fmt;

use cf_core::{MAX_MATERIAL_ID_LEN, Number, Record, RecordStyle, Value, check_short_identifier};
use serde::{Deserialize, Serialize};

use crate::fields::{Checker, Fields, typed, unknown};
use crate::render::card;
use crate::ModelResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    /// At most 16 characters.
    pub id: String,
    /// Descriptive name.
    pub material: String,
    /// kW/(m·K).
    pub conductivity: Option<Number>,
    /// kg/m³.
    pub density: Option<Number>,
    /// kJ/(kg·K).
    pub specific_heat: Option<Number>,
    /// m.
    pub thickness: Option<Number>,
    pub emissivity: Number,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            id: String::new(),
            material: String::new(),
            conductivity: None,
            density: None,
            specific_heat: None,
            thickness: None,
            emissivity: Number::Real(0.9),
        }
    }
}

impl MaterialParams {
    pub fn new(id: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            material: material.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MaterialParams", into = "MaterialParams")]
pub struct Material {
    params: MaterialParams,
}

validated_entity!(Material, MaterialParams);

const FIELDS: &[&str] = &[
    "id",
    "material",
    "conductivity",
    "density",
    "specific_heat",
    "thickness",
    "emissivity",
];

impl Material {
    fn validate(p: &MaterialParams) -> ModelResult<()> {
        typed(Self::ENTITY, "id", check_short_identifier(&p.id, MAX_MATERIAL_ID_LEN))?;
        let c = Checker::new(Self::ENTITY, &p.id);
        c.ensure(!p.material.contains(['\n', '\r']), || {
            "material name must be a single line".to_string()
        })?;
        for (field, value) in [
            ("conductivity", p.conductivity),
            ("density", p.density),
            ("specific_heat", p.specific_heat),
            ("thickness", p.thickness),
        ] {
            if let Some(v) = value {
                c.positive(field, v)?;
            }
        }
        c.fraction("emissivity", p.emissivity)
    }

    pub fn record(&self) -> Record {
        Record::new("MATL")
            .field("ID", &self.id)
            .field("MATERIAL", &self.material)
            .field("CONDUCTIVITY", self.conductivity)
            .field("DENSITY", self.density)
            .field("SPECIFIC_HEAT", self.specific_heat)
            .field("THICKNESS", self.thickness)
            .field("EMISSIVITY", self.emissivity)
    }

    pub fn to_input_string(&self) -> String {
        self.record().render(RecordStyle::Compact)
    }

    pub fn to_html(&self) -> String {
        let mut rows = vec![("Name", self.material.clone())];
        if let Some(k) = self.conductivity {
            rows.push(("Conductivity", format!("{k} kW/(m·K)")));
        }
        if let Some(rho) = self.density {
            rows.push(("Density", format!("{rho} kg/m³")));
        }
        if let Some(cp) = self.specific_heat {
            rows.push(("Specific heat", format!("{cp} kJ/(kg·K)")));
        }
        if let Some(t) = self.thickness {
            rows.push(("Thickness", format!("{t} m")));
        }
        rows.push(("Emissivity", self.emissivity.to_string()));
        card("Material", &self.id, &rows)
    }
}

impl Fields for Material {
    const ENTITY: &'static str = "Material";

    fn field_names(&self) -> &'static [&'static str] {
        FIELDS
    }

    fn get(&self, key: &str) -> ModelResult<Value> {
        let p = &self.params;
        Ok(match key {
            "id" => p.id.clone().into(),
            "material" => p.material.clone().into(),
            "conductivity" => p.conductivity.into(),
            "density" => p.density.into(),
            "specific_heat" => p.specific_heat.into(),
            "thickness" => p.thickness.into(),
            "emissivity" => p.emissivity.into(),
            _ => return Err(unknown(Self::ENTITY, key)),
        })
    }

    fn assign(&mut self, key: &str, value: Value) -> ModelResult<()> {
        let e = Self::ENTITY;
        let p = &mut self.params;
        match key {
            "id" => p.id = typed(e, key, value.to_text())?,
            "material" => p.material = typed(e, key, value.to_text())?,
            "conductivity" => p.conductivity = typed(e, key, value.optional(Value::to_number))?,
            "density" => p.density = typed(e, key, value.optional(Value::to_number))?,
            "specific_heat" => p.specific_heat = typed(e, key, value.optional(Value::to_number))?,
            "thickness" => p.thickness = typed(e, key, value.optional(Value::to_number))?,
            "emissivity" => p.emissivity = typed(e, key, value.to_number())?,
            _ => return Err(unknown(e, key)),
        }
        Ok(())
    }

    fn check(&self) -> ModelResult<()> {
        Self::validate(&self.params)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Material '{}' ({})", self.id, self.material)?;
        if let Some(k) = self.conductivity {
            write!(f, ", k = {k} kW/(m·K)")?;
        }
        if let Some(t) = self.thickness {
            write!(f, ", {t} m thick")?;
        }
        write!(f, ", ε = {}", self.emissivity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelError;

    fn gypsum() -> Material {
        Material::new(MaterialParams {
            conductivity: Some(0.17.into()),
            density: Some(930.into()),
            specific_heat: Some(1.09.into()),
            thickness: Some(0.016.into()),
            ..MaterialParams::new("GYPSUM", "Gypsum Board")
        })
        .unwrap()
    }

    #[test]
    fn full_record() {
        assert_eq!(
            gypsum().to_input_string(),
            "&MATL ID = 'GYPSUM' MATERIAL = 'Gypsum Board' CONDUCTIVITY = 0.17 DENSITY = 930 SPECIFIC_HEAT = 1.09 THICKNESS = 0.016 EMISSIVITY = 0.9 /\n"
        );
    }

    #[test]
    fn minimal_record_omits_unset_properties() {
        let m = Material::new(MaterialParams::new("CONCRETE", "Concrete")).unwrap();
        assert_eq!(
            m.to_input_string(),
            "&MATL ID = 'CONCRETE' MATERIAL = 'Concrete' EMISSIVITY = 0.9 /\n"
        );
    }

    #[test]
    fn long_id_is_a_type_error() {
        let err = Material::new(MaterialParams::new("A_VERY_LONG_MATERIAL_ID", "x")).unwrap_err();
        assert!(matches!(err, ModelError::InvalidType { .. }));
    }

    #[test]
    fn rejected_id_write_keeps_state() {
        let mut m = gypsum();
        let before = m.clone();
        assert!(m.set("id", "THIS_ID_IS_TOO_LONG").is_err());
        assert!(m.set("id", 12).is_err());
        assert_eq!(m, before);
        m.set("id", "GYP2").unwrap();
        assert_eq!(m.id, "GYP2");
    }

    #[test]
    fn clearing_optional_property() {
        let mut m = gypsum();
        m.set("thickness", Value::Unset).unwrap();
        assert!(!m.to_input_string().contains("THICKNESS"));
        assert_eq!(m.get("thickness").unwrap(), Value::Unset);
    }

    #[test]
    fn modify_is_atomic() {
        let mut m = gypsum();
        let before = m.clone();
        let err = m.modify(|p| {
            p.density = Some(1000.into());
            p.emissivity = 1.5.into();
        });
        assert!(err.is_err());
        assert_eq!(m, before);
    }
}
