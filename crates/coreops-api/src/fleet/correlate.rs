// Template/instance correlation over unit names.
//
// A unit named `<base>@<instance>` is an instance of `<base>`; a name
// containing the literal `@.` marks the template definition for that
// base, which is never itself scheduled.

use super::types::{Unit, UnitState};

/// Anything carrying a unit name. Lets units and unit states share the
/// base-name filter.
pub trait Named {
    fn unit_name(&self) -> &str;
}

impl Named for Unit {
    fn unit_name(&self) -> &str {
        &self.name
    }
}

impl Named for UnitState {
    fn unit_name(&self) -> &str {
        &self.name
    }
}

/// Keep the records belonging to `base` (name starts with `"<base>@"`),
/// preserving input order.
pub fn filter_by_base<T: Named>(records: Vec<T>, base: &str) -> Vec<T> {
    let prefix = format!("{base}@");
    records
        .into_iter()
        .filter(|r| r.unit_name().starts_with(&prefix))
        .collect()
}

/// Split the units belonging to `base` into the template definition and
/// its concrete instances, in input order.
///
/// At most one template is expected per base name; if malformed input
/// carries several, the last one observed wins. Zero matches yields
/// `(None, [])`, not an error.
pub fn correlate(units: Vec<Unit>, base: &str) -> (Option<Unit>, Vec<Unit>) {
    let mut template = None;
    let mut instances = Vec::new();

    for unit in filter_by_base(units, base) {
        if unit.name.contains("@.") {
            template = Some(unit);
        } else {
            instances.push(unit);
        }
    }

    (template, instances)
}
