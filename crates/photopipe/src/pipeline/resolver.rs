//! Decides which record fields each processor consumes and which fields a
//! whole pipeline must load up front.

use std::collections::BTreeSet;

use crate::media::injected;

use super::processor::ProcessorDef;

/// Input requirement of one processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// Exactly these fields, looked up by name.
    Named(BTreeSet<String>),
    /// The entire working set.
    All,
}

impl FieldSpec {
    pub fn for_processor(def: &ProcessorDef) -> Self {
        if def.accepts_all {
            return FieldSpec::All;
        }
        FieldSpec::Named(def.params.iter().map(|p| p.to_string()).collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FieldSpec::All)
    }
}

/// Union of all named inputs, minus keys injected by the caller or engine.
///
/// `All` specs contribute nothing: a catch-all consumer takes whatever the
/// others caused to be loaded.
pub fn fetch_fields<'a, I>(specs: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a FieldSpec>,
{
    specs
        .into_iter()
        .filter_map(|spec| match spec {
            FieldSpec::Named(names) => Some(names),
            FieldSpec::All => None,
        })
        .flatten()
        .filter(|name| !injected::contains(name))
        .cloned()
        .collect()
}
