//! Screen identifiers, navigable by number keys.

use std::fmt;

use fieldops_core::EntityKind;

/// Each primary TUI screen. One list screen per entity type plus the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Customers, // 1
    WorkOrders,      // 2
    WarrantyTickets, // 3
    RentalMachines,  // 4
    Quotes,          // 5
    Opportunities,   // 6
    Pipeline,        // 7
}

impl ScreenId {
    /// All screens in tab-bar order.
    pub const ALL: [ScreenId; 7] = [
        Self::Customers,
        Self::WorkOrders,
        Self::WarrantyTickets,
        Self::RentalMachines,
        Self::Quotes,
        Self::Opportunities,
        Self::Pipeline,
    ];

    /// Numeric key (1-7) for this screen.
    pub fn number(self) -> u8 {
        match self {
            Self::Customers => 1,
            Self::WorkOrders => 2,
            Self::WarrantyTickets => 3,
            Self::RentalMachines => 4,
            Self::Quotes => 5,
            Self::Opportunities => 6,
            Self::Pipeline => 7,
        }
    }

    /// Screen from a numeric key. Returns None for out-of-range.
    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// The list page behind this screen, if it is one.
    pub fn entity(self) -> Option<EntityKind> {
        match self {
            Self::Customers => Some(EntityKind::Customers),
            Self::WorkOrders => Some(EntityKind::WorkOrders),
            Self::WarrantyTickets => Some(EntityKind::WarrantyTickets),
            Self::RentalMachines => Some(EntityKind::RentalMachines),
            Self::Quotes => Some(EntityKind::Quotes),
            Self::Opportunities => Some(EntityKind::Opportunities),
            Self::Pipeline => None,
        }
    }

    /// Short label for the tab bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Customers => "Customers",
            Self::WorkOrders => "Work Orders",
            Self::WarrantyTickets => "Warranty",
            Self::RentalMachines => "Rental",
            Self::Quotes => "Quotes",
            Self::Opportunities => "Opportunities",
            Self::Pipeline => "Pipeline",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
