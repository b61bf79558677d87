//! Select stage: which units an invocation acts on

use crate::config::{ConfigDocument, PackageUnit, normalize_name};
use crate::error::{Result, runtime};

/// Units chosen by the selectors, in document order
#[derive(Debug)]
pub struct Selection<'a> {
    pub units: Vec<&'a PackageUnit>,
    /// Selectors that matched nothing
    pub unmatched: Vec<String>,
}

/// Whether `selector` names `unit`: its name, its directory, or a prefix of
/// its directory (compared normalized)
pub fn matches(unit: &PackageUnit, selector: &str) -> bool {
    let selector = normalize_name(selector);
    if selector.is_empty() {
        return false;
    }
    normalize_name(&unit.name) == selector
        || normalize_name(&unit.unit_dir()).starts_with(&selector)
}

/// Filter the document's units; `None` selects all of them
pub fn decide_select<'a>(
    document: &'a ConfigDocument,
    selectors: Option<&[String]>,
) -> Result<Selection<'a>> {
    let Some(selectors) = selectors else {
        if document.is_empty() {
            return Err(runtime::no_units_selected(&[]));
        }
        return Ok(Selection {
            units: document.units().iter().collect(),
            unmatched: Vec::new(),
        });
    };

    let units: Vec<&PackageUnit> = document
        .units()
        .iter()
        .filter(|u| selectors.iter().any(|s| matches(u, s)))
        .collect();
    if units.is_empty() {
        return Err(runtime::no_units_selected(selectors));
    }

    let unmatched = selectors
        .iter()
        .filter(|s| !document.units().iter().any(|u| matches(u, s)))
        .cloned()
        .collect();
    Ok(Selection { units, unmatched })
}
