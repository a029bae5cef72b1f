//! Filing metadata extracted from the monthly feeds.

use serde::{Deserialize, Serialize};

/// One of the twelve per-item fields carried by an EDGAR XBRL feed.
///
/// Each field has a label, the local name of the element in the feed, and a
/// column, its name in the `feeds` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedField {
    /// Filer name
    CompanyName,
    /// Form type (e.g., "10-K", "10-Q")
    FormType,
    /// Filing date as published (`MM/DD/YYYY`)
    FilingDate,
    /// Filer CIK
    CikNumber,
    /// Accession number (unique submission identifier)
    AccessionNumber,
    /// SEC file number
    FileNumber,
    /// Acceptance timestamp
    AcceptanceDatetime,
    /// Reporting period
    Period,
    /// Reviewing office
    AssistantDirector,
    /// Standard industrial classification
    AssignedSic,
    /// Fiscal year end (`MMDD`)
    FiscalYearEnd,
    /// XBRL instance document URL
    XbrlFiles,
}

impl FeedField {
    /// All fields, in table column order.
    pub const ALL: [Self; 12] = [
        Self::CompanyName,
        Self::FormType,
        Self::FilingDate,
        Self::CikNumber,
        Self::AccessionNumber,
        Self::FileNumber,
        Self::AcceptanceDatetime,
        Self::Period,
        Self::AssistantDirector,
        Self::AssignedSic,
        Self::FiscalYearEnd,
        Self::XbrlFiles,
    ];

    /// Local element name in the feed.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CompanyName => "companyName",
            Self::FormType => "formType",
            Self::FilingDate => "filingDate",
            Self::CikNumber => "cikNumber",
            Self::AccessionNumber => "accessionNumber",
            Self::FileNumber => "fileNumber",
            Self::AcceptanceDatetime => "acceptanceDatetime",
            Self::Period => "period",
            Self::AssistantDirector => "assistantDirector",
            Self::AssignedSic => "assignedSic",
            Self::FiscalYearEnd => "fiscalYearEnd",
            Self::XbrlFiles => "xbrlFiles",
        }
    }

    /// Column name in the `feeds` table.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::CompanyName => "company_name",
            Self::FormType => "form_type",
            Self::FilingDate => "filing_date",
            Self::CikNumber => "cik_number",
            Self::AccessionNumber => "accession_number",
            Self::FileNumber => "file_number",
            Self::AcceptanceDatetime => "acceptance_datetime",
            Self::Period => "period",
            Self::AssistantDirector => "assistant_director",
            Self::AssignedSic => "assigned_sic",
            Self::FiscalYearEnd => "fiscal_year_end",
            Self::XbrlFiles => "xbrl_files",
        }
    }

    /// Field whose feed label is `label`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == label)
    }
}

/// A single filing listed in a monthly feed.
///
/// Everything except the accession number is optional: a field missing from
/// the feed item is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    /// Filer name
    pub company_name: Option<String>,
    /// Form type (e.g., "10-K", "10-Q")
    pub form_type: Option<String>,
    /// Filing date, verbatim from the feed
    pub filing_date: Option<String>,
    /// Filer CIK, verbatim (usually zero-padded to 10 digits)
    pub cik_number: Option<String>,
    /// Accession number (unique submission identifier)
    pub accession_number: String,
    /// SEC file number
    pub file_number: Option<String>,
    /// Acceptance timestamp
    pub acceptance_datetime: Option<String>,
    /// Reporting period
    pub period: Option<String>,
    /// Reviewing office
    pub assistant_director: Option<String>,
    /// Standard industrial classification
    pub assigned_sic: Option<String>,
    /// Fiscal year end
    pub fiscal_year_end: Option<String>,
    /// URL of the XBRL instance document, if the filing has one
    pub xbrl_files: Option<String>,
}

impl FilingRecord {
    /// Value of an optional field. The accession number is always present.
    pub fn get(&self, field: FeedField) -> Option<&str> {
        match field {
            FeedField::CompanyName => self.company_name.as_deref(),
            FeedField::FormType => self.form_type.as_deref(),
            FeedField::FilingDate => self.filing_date.as_deref(),
            FeedField::CikNumber => self.cik_number.as_deref(),
            FeedField::AccessionNumber => Some(&self.accession_number),
            FeedField::FileNumber => self.file_number.as_deref(),
            FeedField::AcceptanceDatetime => self.acceptance_datetime.as_deref(),
            FeedField::Period => self.period.as_deref(),
            FeedField::AssistantDirector => self.assistant_director.as_deref(),
            FeedField::AssignedSic => self.assigned_sic.as_deref(),
            FeedField::FiscalYearEnd => self.fiscal_year_end.as_deref(),
            FeedField::XbrlFiles => self.xbrl_files.as_deref(),
        }
    }

    /// Set a field. A `None` accession number leaves the key untouched.
    pub fn set(&mut self, field: FeedField, value: Option<String>) {
        match field {
            FeedField::CompanyName => self.company_name = value,
            FeedField::FormType => self.form_type = value,
            FeedField::FilingDate => self.filing_date = value,
            FeedField::CikNumber => self.cik_number = value,
            FeedField::AccessionNumber => {
                if let Some(value) = value {
                    self.accession_number = value;
                }
            }
            FeedField::FileNumber => self.file_number = value,
            FeedField::AcceptanceDatetime => self.acceptance_datetime = value,
            FeedField::Period => self.period = value,
            FeedField::AssistantDirector => self.assistant_director = value,
            FeedField::AssignedSic => self.assigned_sic = value,
            FeedField::FiscalYearEnd => self.fiscal_year_end = value,
            FeedField::XbrlFiles => self.xbrl_files = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip() {
        for field in FeedField::ALL {
            assert_eq!(FeedField::from_label(field.label()), Some(field));
        }
        assert_eq!(FeedField::from_label("xbrlFile"), None);
    }

    #[test]
    fn test_columns_are_snake_case_labels() {
        for field in FeedField::ALL {
            let snake: String = field
                .label()
                .chars()
                .flat_map(|c| {
                    if c.is_ascii_uppercase() {
                        vec!['_', c.to_ascii_lowercase()]
                    } else {
                        vec![c]
                    }
                })
                .collect();
            assert_eq!(field.column(), snake);
        }
    }

    #[test]
    fn test_get_set() {
        let mut record = FilingRecord::default();
        record.set(FeedField::AccessionNumber, Some("0001".to_string()));
        record.set(FeedField::FormType, Some("10-K".to_string()));
        record.set(FeedField::AccessionNumber, None);

        assert_eq!(record.get(FeedField::AccessionNumber), Some("0001"));
        assert_eq!(record.get(FeedField::FormType), Some("10-K"));
        assert_eq!(record.get(FeedField::XbrlFiles), None);
    }
}
