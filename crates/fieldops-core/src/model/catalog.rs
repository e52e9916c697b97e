// ── Entity catalog ──
//
// One `PageSpec` per list page: REST collection, declared columns, filter
// options, delete-locked statuses, and form rules. Specs are static; the
// list controller is generic over them.

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use fieldops_api::UpdateMethod;

use crate::form::{FieldRule, FieldSpec};

/// A column the page knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    /// Field path in the entity (`customer.name`). Also the visibility key.
    pub key: &'static str,
    pub label: &'static str,
    pub default_visible: bool,
}

/// A server-side filter and the values the UI offers for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterDef {
    pub key: &'static str,
    pub label: &'static str,
    pub options: &'static [&'static str],
}

/// Static description of one entity list page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpec {
    /// Persistence key for page-scoped preferences.
    pub id: &'static str,
    /// REST collection path.
    pub collection: &'static str,
    pub title: &'static str,
    /// Singular noun for messages ("work order").
    pub noun: &'static str,
    pub columns: &'static [ColumnDef],
    pub filters: &'static [FilterDef],
    pub status_field: &'static str,
    /// Statuses that block deletion before any request is made.
    pub locked_statuses: &'static [&'static str],
    pub form: &'static [FieldSpec],
    pub update_method: UpdateMethod,
}

impl PageSpec {
    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn filter(&self, key: &str) -> Option<&FilterDef> {
        self.filters.iter().find(|f| f.key == key)
    }

    /// Whether `status` (any case) blocks deletion.
    pub fn is_locked(&self, status: &str) -> bool {
        self.locked_statuses
            .iter()
            .any(|s| s.eq_ignore_ascii_case(status.trim()))
    }
}

const fn col(key: &'static str, label: &'static str) -> ColumnDef {
    ColumnDef {
        key,
        label,
        default_visible: true,
    }
}

const fn hidden(key: &'static str, label: &'static str) -> ColumnDef {
    ColumnDef {
        key,
        label,
        default_visible: false,
    }
}

/// Every list page in the application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Customers,
    WorkOrders,
    WarrantyTickets,
    RentalMachines,
    Quotes,
    Opportunities,
}

impl EntityKind {
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    pub fn spec(self) -> &'static PageSpec {
        match self {
            Self::Customers => &CUSTOMERS,
            Self::WorkOrders => &WORK_ORDERS,
            Self::WarrantyTickets => &WARRANTY_TICKETS,
            Self::RentalMachines => &RENTAL_MACHINES,
            Self::Quotes => &QUOTES,
            Self::Opportunities => &OPPORTUNITIES,
        }
    }
}

// ── Page definitions ────────────────────────────────────────────────

const WORK_ORDER_STATUSES: &[&str] = &["open", "in_progress", "waiting_parts", "completed"];
const PRIORITIES: &[&str] = &["low", "normal", "high", "urgent"];
const QUOTE_STATUSES: &[&str] = &["draft", "sent", "accepted", "rejected", "converted"];

/// Pipeline stages in board order.
pub const PIPELINE_STAGES: &[&str] = &["lead", "qualified", "proposal", "negotiation", "won", "lost"];

pub static CUSTOMERS: PageSpec = PageSpec {
    id: "customers",
    collection: "customers",
    title: "Customers",
    noun: "customer",
    columns: &[
        col("name", "Name"),
        col("email", "Email"),
        col("phone", "Phone"),
        col("city", "City"),
        col("customer_type", "Type"),
        hidden("business_id", "Business ID"),
        hidden("created_at", "Created"),
    ],
    filters: &[FilterDef {
        key: "customer_type",
        label: "Type",
        options: &["private", "business"],
    }],
    status_field: "status",
    locked_statuses: &[],
    form: &[
        FieldSpec {
            key: "name",
            label: "Name",
            rules: &[FieldRule::Required, FieldRule::MinLength(2)],
        },
        FieldSpec {
            key: "email",
            label: "Email",
            rules: &[FieldRule::Email],
        },
        FieldSpec {
            key: "customer_type",
            label: "Type",
            rules: &[FieldRule::OneOf(&["private", "business"])],
        },
    ],
    update_method: UpdateMethod::Patch,
};

pub static WORK_ORDERS: PageSpec = PageSpec {
    id: "work-orders",
    collection: "work-orders",
    title: "Work Orders",
    noun: "work order",
    columns: &[
        col("number", "WO #"),
        col("title", "Title"),
        col("customer.name", "Customer"),
        col("status", "Status"),
        col("priority", "Priority"),
        col("technician.name", "Technician"),
        col("due_date", "Due"),
        hidden("machine.serial_number", "Serial"),
        hidden("created_at", "Created"),
    ],
    filters: &[
        FilterDef {
            key: "status",
            label: "Status",
            options: WORK_ORDER_STATUSES,
        },
        FilterDef {
            key: "priority",
            label: "Priority",
            options: PRIORITIES,
        },
    ],
    status_field: "status",
    locked_statuses: &["completed"],
    form: &[
        FieldSpec {
            key: "title",
            label: "Title",
            rules: &[FieldRule::Required, FieldRule::MinLength(3)],
        },
        FieldSpec {
            key: "customer_id",
            label: "Customer",
            rules: &[FieldRule::Required],
        },
        FieldSpec {
            key: "priority",
            label: "Priority",
            rules: &[FieldRule::OneOf(PRIORITIES)],
        },
        FieldSpec {
            key: "status",
            label: "Status",
            rules: &[FieldRule::OneOf(WORK_ORDER_STATUSES)],
        },
    ],
    update_method: UpdateMethod::Patch,
};

pub static WARRANTY_TICKETS: PageSpec = PageSpec {
    id: "warranty-tickets",
    collection: "warranty-tickets",
    title: "Warranty Tickets",
    noun: "warranty ticket",
    columns: &[
        col("ticket_number", "Ticket #"),
        col("customer.name", "Customer"),
        col("product", "Product"),
        col("status", "Status"),
        col("purchase_date", "Purchased"),
        hidden("serial_number", "Serial"),
        hidden("created_at", "Created"),
    ],
    filters: &[FilterDef {
        key: "status",
        label: "Status",
        options: &["new", "in_review", "approved", "rejected", "completed"],
    }],
    status_field: "status",
    locked_statuses: &["completed"],
    form: &[
        FieldSpec {
            key: "customer_id",
            label: "Customer",
            rules: &[FieldRule::Required],
        },
        FieldSpec {
            key: "product",
            label: "Product",
            rules: &[FieldRule::Required],
        },
        FieldSpec {
            key: "description",
            label: "Description",
            rules: &[FieldRule::MinLength(10)],
        },
    ],
    update_method: UpdateMethod::Patch,
};

pub static RENTAL_MACHINES: PageSpec = PageSpec {
    id: "rental-machines",
    collection: "rental-machines",
    title: "Rental Fleet",
    noun: "rental machine",
    columns: &[
        col("name", "Machine"),
        col("model", "Model"),
        col("serial_number", "Serial"),
        col("status", "Status"),
        col("daily_rate", "Daily Rate"),
        hidden("location", "Location"),
        hidden("last_service_date", "Last Service"),
    ],
    filters: &[FilterDef {
        key: "status",
        label: "Status",
        options: &["available", "rented", "maintenance", "retired"],
    }],
    status_field: "status",
    locked_statuses: &["rented"],
    form: &[
        FieldSpec {
            key: "name",
            label: "Machine",
            rules: &[FieldRule::Required],
        },
        FieldSpec {
            key: "serial_number",
            label: "Serial",
            rules: &[FieldRule::Required, FieldRule::MinLength(4)],
        },
        FieldSpec {
            key: "daily_rate",
            label: "Daily rate",
            rules: &[FieldRule::NumberRange {
                min: 0.0,
                max: 100_000.0,
            }],
        },
    ],
    update_method: UpdateMethod::Put,
};

pub static QUOTES: PageSpec = PageSpec {
    id: "quotes",
    collection: "quotes",
    title: "Quotes",
    noun: "quote",
    columns: &[
        col("quote_number", "Quote #"),
        col("customer.name", "Customer"),
        col("total", "Total"),
        col("status", "Status"),
        col("valid_until", "Valid Until"),
        hidden("created_by.name", "Created By"),
        hidden("created_at", "Created"),
    ],
    filters: &[FilterDef {
        key: "status",
        label: "Status",
        options: QUOTE_STATUSES,
    }],
    status_field: "status",
    locked_statuses: &["converted"],
    form: &[
        FieldSpec {
            key: "customer_id",
            label: "Customer",
            rules: &[FieldRule::Required],
        },
        FieldSpec {
            key: "total",
            label: "Total",
            rules: &[FieldRule::NumberRange {
                min: 0.0,
                max: 10_000_000.0,
            }],
        },
        FieldSpec {
            key: "status",
            label: "Status",
            rules: &[FieldRule::OneOf(QUOTE_STATUSES)],
        },
    ],
    update_method: UpdateMethod::Patch,
};

pub static OPPORTUNITIES: PageSpec = PageSpec {
    id: "opportunities",
    collection: "opportunities",
    title: "Sales Pipeline",
    noun: "opportunity",
    columns: &[
        col("title", "Title"),
        col("customer.name", "Customer"),
        col("value", "Value"),
        col("stage", "Stage"),
        col("owner.name", "Owner"),
        col("expected_close", "Expected Close"),
        hidden("probability", "Probability"),
    ],
    filters: &[FilterDef {
        key: "stage",
        label: "Stage",
        options: PIPELINE_STAGES,
    }],
    status_field: "stage",
    locked_statuses: &["won"],
    form: &[
        FieldSpec {
            key: "title",
            label: "Title",
            rules: &[FieldRule::Required],
        },
        FieldSpec {
            key: "value",
            label: "Value",
            rules: &[FieldRule::NumberRange {
                min: 0.0,
                max: 100_000_000.0,
            }],
        },
        FieldSpec {
            key: "stage",
            label: "Stage",
            rules: &[FieldRule::OneOf(PIPELINE_STAGES)],
        },
    ],
    update_method: UpdateMethod::Patch,
};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use super::*;

    #[test]
    fn kinds_parse_from_kebab_case() {
        assert_eq!(EntityKind::from_str("work-orders").unwrap(), EntityKind::WorkOrders);
        assert_eq!(EntityKind::from_str("Quotes").unwrap(), EntityKind::Quotes);
        assert_eq!(EntityKind::RentalMachines.to_string(), "rental-machines");
    }

    #[test]
    fn page_ids_are_unique_and_match_kind() {
        let mut seen = HashSet::new();
        for kind in EntityKind::all() {
            let spec = kind.spec();
            assert_eq!(spec.id, kind.as_ref());
            assert!(seen.insert(spec.id), "duplicate page id {}", spec.id);
        }
    }

    #[test]
    fn column_keys_are_unique_per_page() {
        for kind in EntityKind::all() {
            let spec = kind.spec();
            let keys: HashSet<_> = spec.columns.iter().map(|c| c.key).collect();
            assert_eq!(keys.len(), spec.columns.len(), "{}", spec.id);
        }
    }

    #[test]
    fn locked_statuses_ignore_case() {
        assert!(WORK_ORDERS.is_locked("Completed"));
        assert!(QUOTES.is_locked("converted"));
        assert!(!QUOTES.is_locked("draft"));
        assert!(!CUSTOMERS.is_locked("anything"));
    }
}
