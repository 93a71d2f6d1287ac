//! Follow-up view requests handed to the presentation layer.
//!
//! These are plain data: the core never acts on them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

coded_enum! {
    /// Record collection a view is opened on.
    RecordModel {
        Doctor => "doctor",
        Patient => "patient",
        Visit => "visit",
        Diagnosis => "diagnosis",
        Schedule => "schedule",
        PatientCardExport => "patient_card_export",
    }
}

coded_enum! {
    /// How records are presented.
    ViewMode {
        List => "list",
        Form => "form",
        Calendar => "calendar",
        Pivot => "pivot",
        Graph => "graph",
    }
}

coded_enum! {
    /// Where the view opens.
    ViewTarget {
        Current => "current",
        New => "new",
    }
}

/// Comparison used in a domain filter term.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    In,
    Gte,
    Lte,
}

/// One `(field, op, value)` term; terms of a domain are AND-ed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainFilter {
    /// Dotted path, e.g. `visit.patient.country_code`
    pub field: String,
    pub op: FilterOp,
    pub value: serde_json::Value,
}

impl DomainFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

/// Request to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewAction {
    /// Open a view over `model` restricted by `domain`.
    Open {
        title: String,
        model: RecordModel,
        view_modes: Vec<ViewMode>,
        domain: Vec<DomainFilter>,
        /// Defaults for new records and grouping hints
        context: BTreeMap<String, serde_json::Value>,
        target: ViewTarget,
        /// Specific record to show in a form view
        record_id: Option<String>,
    },
    /// Close the current dialog.
    Close,
}

impl ViewAction {
    /// An empty `Open` action in the current window.
    pub fn open(title: impl Into<String>, model: RecordModel, view_modes: &[ViewMode]) -> Self {
        ViewAction::Open {
            title: title.into(),
            model,
            view_modes: view_modes.to_vec(),
            domain: Vec::new(),
            context: BTreeMap::new(),
            target: ViewTarget::Current,
            record_id: None,
        }
    }

    /// Add a filter term (no-op on `Close`).
    pub fn filter(mut self, term: DomainFilter) -> Self {
        if let ViewAction::Open { domain, .. } = &mut self {
            domain.push(term);
        }
        self
    }

    /// Add a context entry (no-op on `Close`).
    pub fn with_context(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        if let ViewAction::Open { context, .. } = &mut self {
            context.insert(key.to_string(), value.into());
        }
        self
    }

    /// Open in a dialog instead of the current window (no-op on `Close`).
    pub fn in_dialog(mut self) -> Self {
        if let ViewAction::Open { target, .. } = &mut self {
            *target = ViewTarget::New;
        }
        self
    }

    /// Focus a single record (no-op on `Close`).
    pub fn for_record(mut self, id: impl Into<String>) -> Self {
        if let ViewAction::Open { record_id, .. } = &mut self {
            *record_id = Some(id.into());
        }
        self
    }

    pub fn is_close(&self) -> bool {
        matches!(self, ViewAction::Close)
    }

    /// Context value by key, `None` for `Close`.
    pub fn context_value(&self, key: &str) -> Option<&serde_json::Value> {
        match self {
            ViewAction::Open { context, .. } => context.get(key),
            ViewAction::Close => None,
        }
    }
}
