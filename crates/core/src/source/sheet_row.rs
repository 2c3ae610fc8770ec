//! Positional schema of the spreadsheet export.
//!
//! Columns: Event Name, Event ID, Order #, Order Date, First Name, Last Name,
//! Email, Location 1, Location 2, Location 3, Attendee Status, Referrer.
//! Google Sheets drops trailing empty cells, so the referrer column is
//! frequently missing from a row.

use tracing::debug;

use crate::ticket::{clean_field, is_secondary_attending, NormalizedTicket, TicketOrigin};

/// Why a spreadsheet row did not produce a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Row ends before the attendee status column.
    TooFewColumns(usize),
    /// Status does not indicate attendance.
    NotAttending(String),
}

/// Result of validating one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Valid(NormalizedTicket),
    Skipped(SkipReason),
}

/// One row of the export with named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow {
    pub event_name: Option<String>,
    pub event_id: Option<String>,
    pub order_id: Option<String>,
    pub order_date: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub location_1: Option<String>,
    pub location_2: Option<String>,
    /// Seat number.
    pub location_3: Option<String>,
    pub attendee_status: Option<String>,
    pub referrer: Option<String>,
}

impl SheetRow {
    /// Rows must reach the attendee status column.
    pub const MIN_COLUMNS: usize = 11;

    /// Map cells by position. Every field is trimmed; blank cells become `None`.
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Result<Self, SkipReason> {
        if cells.len() < Self::MIN_COLUMNS {
            return Err(SkipReason::TooFewColumns(cells.len()));
        }

        let cell = |i: usize| clean_field(cells.get(i).map(|c| c.as_ref()));

        Ok(Self {
            event_name: cell(0),
            event_id: cell(1),
            order_id: cell(2),
            order_date: cell(3),
            first_name: cell(4),
            last_name: cell(5),
            email: cell(6),
            location_1: cell(7),
            location_2: cell(8),
            location_3: cell(9),
            attendee_status: cell(10),
            referrer: cell(11),
        })
    }

    /// Validate attendance and convert into a secondary ticket.
    pub fn into_outcome(self) -> RowOutcome {
        let status = self.attendee_status.unwrap_or_default();
        if !is_secondary_attending(&status) {
            return RowOutcome::Skipped(SkipReason::NotAttending(status));
        }

        let ticket = NormalizedTicket {
            event_id: self.event_id,
            order_id: self.order_id,
            seat: self.location_3,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            status,
            referrer: None,
            origin: TicketOrigin::Secondary,
        }
        .with_referrer(self.referrer.as_deref());

        RowOutcome::Valid(ticket)
    }

    /// Parse and validate a raw row in one step.
    pub fn parse<S: AsRef<str>>(cells: &[S]) -> RowOutcome {
        match Self::from_cells(cells) {
            Ok(row) => row.into_outcome(),
            Err(reason) => RowOutcome::Skipped(reason),
        }
    }
}

/// Convert a value range into tickets. The first row is the header.
pub fn parse_sheet_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Vec<NormalizedTicket> {
    let mut skipped = 0usize;
    let tickets: Vec<NormalizedTicket> = rows
        .iter()
        .skip(1)
        .filter_map(|cells| match SheetRow::parse(cells) {
            RowOutcome::Valid(ticket) => Some(ticket),
            RowOutcome::Skipped(_) => {
                skipped += 1;
                None
            }
        })
        .collect();

    debug!(tickets = tickets.len(), skipped = skipped, "Parsed spreadsheet rows");
    tickets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, referrer: Option<&str>) -> Vec<String> {
        let mut cells: Vec<String> = [
            "The Nutcracker",
            " 1849540227609 ",
            "A3",
            "2024-11-01",
            "Fritz",
            "Stahlbaum",
            "fritz@example.com",
            "Orchestra",
            "Row C",
            " 14 ",
            status,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        if let Some(r) = referrer {
            cells.push(r.to_string());
        }
        cells
    }

    #[test]
    fn test_maps_columns_by_position() {
        let parsed = SheetRow::from_cells(&row("Attending", Some(" Dancer X "))).unwrap();
        assert_eq!(parsed.event_id.as_deref(), Some("1849540227609"));
        assert_eq!(parsed.order_id.as_deref(), Some("A3"));
        assert_eq!(parsed.location_3.as_deref(), Some("14"));
        assert_eq!(parsed.attendee_status.as_deref(), Some("Attending"));
        assert_eq!(parsed.referrer.as_deref(), Some("Dancer X"));
    }

    #[test]
    fn test_valid_row_becomes_secondary_ticket() {
        let RowOutcome::Valid(ticket) = SheetRow::parse(&row("Attending", Some("Dancer X"))) else {
            panic!("expected a valid row");
        };
        assert_eq!(ticket.origin, TicketOrigin::Secondary);
        assert_eq!(ticket.seat.as_deref(), Some("14"));
        assert_eq!(ticket.referrer.as_deref(), Some("Dancer X"));
    }

    #[test]
    fn test_missing_referrer_column_is_none() {
        let RowOutcome::Valid(ticket) = SheetRow::parse(&row("Attending", None)) else {
            panic!("expected a valid row");
        };
        assert!(ticket.referrer.is_none());
    }

    #[test]
    fn test_na_and_blank_referrers_are_none() {
        for value in ["", "  ", "N/A", "n/a"] {
            let RowOutcome::Valid(ticket) = SheetRow::parse(&row("Attending", Some(value))) else {
                panic!("expected a valid row");
            };
            assert!(ticket.referrer.is_none(), "referrer {:?} should be dropped", value);
        }
    }

    #[test]
    fn test_short_row_is_skipped() {
        let cells = vec!["only", "three", "cells"];
        assert_eq!(
            SheetRow::parse(&cells),
            RowOutcome::Skipped(SkipReason::TooFewColumns(3))
        );
    }

    #[test]
    fn test_non_attending_row_is_skipped() {
        assert_eq!(
            SheetRow::parse(&row("Cancelled", Some("Dancer X"))),
            RowOutcome::Skipped(SkipReason::NotAttending("Cancelled".to_string()))
        );
    }

    #[test]
    fn test_blank_order_id_is_kept_without_match_key() {
        let mut cells = row("Attending", Some("Dancer Z"));
        cells[2] = "  ".to_string();
        let RowOutcome::Valid(ticket) = SheetRow::parse(&cells) else {
            panic!("expected a valid row");
        };
        assert!(ticket.order_id.is_none());
        assert!(ticket.match_key().is_none());
    }

    #[test]
    fn test_parse_sheet_rows_skips_header_and_invalid_rows() {
        let rows = vec![
            row("Attendee Status", Some("Which company dancer referred you?")),
            row("Attending", Some("Dancer X")),
            vec!["short".to_string()],
            row("Not Attending", None),
            row("Attending", None),
        ];
        let tickets = parse_sheet_rows(&rows);
        // status is a substring match, so "Not Attending" passes too
        assert_eq!(tickets.len(), 3);
        assert_eq!(tickets[0].referrer.as_deref(), Some("Dancer X"));
    }

    #[test]
    fn test_parse_sheet_rows_empty() {
        let rows: Vec<Vec<String>> = vec![];
        assert!(parse_sheet_rows(&rows).is_empty());
    }
}
