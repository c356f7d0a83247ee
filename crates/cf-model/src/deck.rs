//! Whole-deck rendering.

use std::collections::HashSet;

use cf_core::{Record, RecordStyle};

use crate::model::CfastModel;

fn section(out: &mut String, header: &str, records: impl IntoIterator<Item = Record>, style: RecordStyle) {
    out.push('\n');
    out.push_str(header);
    out.push('\n');
    for record in records {
        out.push_str(&record.render(style));
    }
}

/// Renders the complete input deck: the scenario block, one commented
/// section per entity kind in fixed order, then `&TAIL /`.
pub fn render_deck(model: &CfastModel, style: RecordStyle) -> String {
    let mut out = model.environment().render(style);

    section(
        &mut out,
        "!! Material Properties",
        model.materials().iter().map(|m| m.record()),
        style,
    );
    section(
        &mut out,
        "!! Compartments",
        model.compartments().iter().map(|c| c.record()),
        style,
    );
    section(
        &mut out,
        "!! Wall Vents",
        model.wall_vents().iter().map(|v| v.record()),
        style,
    );
    section(
        &mut out,
        "!! Ceiling and Floor Vents",
        model.ceiling_floor_vents().iter().map(|v| v.record()),
        style,
    );
    section(
        &mut out,
        "!! Mechanical Vents",
        model.mechanical_vents().iter().map(|v| v.record()),
        style,
    );

    // A shared definition is written once, after its first instance.
    let mut defined = HashSet::new();
    let fires = model.fires().iter().flat_map(|fire| {
        let mut recs = vec![fire.fire_record()];
        if defined.insert(fire.fire_id.clone()) {
            recs.extend(fire.definition_records());
        }
        recs
    });
    section(&mut out, "!! Fires", fires, style);

    section(
        &mut out,
        "!! Devices",
        model.devices().iter().map(|d| d.record()),
        style,
    );
    section(
        &mut out,
        "!! Surface Connections",
        model.surface_connections().iter().map(|c| c.record()),
        style,
    );

    out.push_str("\n&TAIL /\n");
    out
}
