// Canonical column labels. Adapter rename maps target these and the
// aggregated output is keyed by them.

/// ISIN of the fund owning the holding. Stamped by the harmonizer.
pub const COLUMN_FUND_ISIN: &str = "fundIsin";

/// ISIN of the held security, or the placeholder for cash and other buckets.
pub const COLUMN_SECURITY_ISIN: &str = "securityIsin";

pub const COLUMN_TICKER: &str = "ticker";
pub const COLUMN_NAME: &str = "name";

/// Percentage weight of the security within the fund.
pub const COLUMN_WEIGHT: &str = "weight";

pub const COLUMN_PRICE: &str = "price";
pub const COLUMN_SECTOR: &str = "sector";
pub const COLUMN_EXCHANGE: &str = "exchange";
pub const COLUMN_COUNTRY: &str = "country";
pub const COLUMN_CURRENCY: &str = "currency";

/// Columns that must be present for a harmonized set to be aggregated.
pub const REQUIRED_COLUMNS: [&str; 3] = [COLUMN_FUND_ISIN, COLUMN_SECURITY_ISIN, COLUMN_WEIGHT];

/// Security identifier marking a non-security bucket (cash, unidentified instruments).
pub const DEFAULT_PLACEHOLDER_SECURITY_ISIN: &str = "-";

/// Default namespace of Excel 2003 spreadsheet XML documents.
pub const SPREADSHEET_XML_NAMESPACE: &str = "urn:schemas-microsoft-com:office:spreadsheet";

/// Conventional prefix bound to [`SPREADSHEET_XML_NAMESPACE`].
pub const SPREADSHEET_XML_PREFIX: &str = "ss";

/// Upper bound on columns per spreadsheet row (Excel 2007+ sheet width).
pub const MAX_SPREADSHEET_COLUMNS: usize = 16_384;

/// Version of the embedded adapter table this build understands.
pub const ADAPTER_TABLE_VERSION: u32 = 1;
