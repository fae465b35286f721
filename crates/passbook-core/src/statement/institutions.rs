//! Built-in institution schemas.

use lazy_static::lazy_static;
use regex::Regex;

use super::amount::AmountShape;
use super::blocks::{SectionMarker, SectionRules};
use super::noise::NoiseRule;
use super::patterns::{
    DATE_DASHED, DATE_DAY_MON_YEAR, DATE_NUMERIC_LOOSE, DATE_SLASHED, DATE_TIME_START,
};
use super::repair::Repair;
use super::schema::{
    AmountLayout, AmountScope, ColumnMap, InstitutionSchema, Peel, PositionalLayout, Side, Slot,
    SweepLayout, TableLayout, TokenScanLayout,
};

lazy_static! {
    static ref NUMERIC_OR_NAMED_DATE: Regex = Regex::new(
        r"^(\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|\d{1,2} [A-Za-z]{3} \d{4})"
    ).unwrap();
    static ref DASHED_CELL: Regex = Regex::new(r"^\d{2}-\d{2}-\d{4}$").unwrap();

    // Table header and summary rows
    static ref TXN_HEADER_ROW: Regex = Regex::new(r"(?i)^\s*(txn|date|tran(saction)?\s+date)\b").unwrap();
    static ref CLOSING_BALANCE: Regex = Regex::new(r"(?i)\bclosing\s+balance\b").unwrap();
    static ref TOTAL_ROW: Regex = Regex::new(r"(?i)^\s*(grand\s+)?total\b").unwrap();
    static ref CUB_HEADER_ROW: Regex = Regex::new(
        r"(?i)^\s*(date|transaction date|value date)\b.*\b(description|particulars|cheque|ref no|debit|credit|balance|amount)\b"
    ).unwrap();
    static ref PAGE_HEADER: Regex = Regex::new(r"(?i)^\s*page\s").unwrap();

    // ICICI
    static ref ICICI_SUMMARY: Regex = Regex::new(
        r"(?i)\b(opening balance|closing balance|account summary|page no|grand total)\b|^\s*total\s*:|statement of transactions"
    ).unwrap();
    static ref ICICI_SAVINGS_MASK: Regex = Regex::new(r"(?i)savings\s+x{4,}").unwrap();
    static ref ICICI_CIN: Regex = Regex::new(r"(?i)\bcin\s*:").unwrap();
    static ref ICICI_LEGEND: Regex = Regex::new(
        r"(?i)^(vat/mat/nfs|eba|vps/ips|top)\s*-"
    ).unwrap();
    // Closes the transaction list for good
    static ref ICICI_END: Regex = Regex::new(
        r"(?i)account related other information|sincerely|team icici|legends for transactions"
    ).unwrap();
    // Repeated on every page
    static ref ICICI_PAGE_FOOTER: Regex = Regex::new(
        r"(?i)category of service|corporate office|registered office|icicibank\.com"
    ).unwrap();
    static ref ICICI_INTIMATION: Regex = Regex::new(
        r"(?is)ACCOUNT\s+TYPE\s+ACCOUNT\s+NUMBER.*?This\s+is\s+an\s+authenticated\s+intimation/statement\."
    ).unwrap();

    // KVB
    static ref KVB_PAGE_NO: Regex = Regex::new(r"(?i)^page\s+no\.").unwrap();
    static ref KVB_NOTE: Regex = Regex::new(r"(?i)^note\b").unwrap();

    // Federal
    static ref FEDERAL_FOOTER: Regex = Regex::new(
        r"(?i)(PAGE\s*\d+|THE\s+FEDERAL\s+BANK|BRANCH:|CIN:|WEBSITE:|PH:).*$"
    ).unwrap();

    // IndusInd
    static ref INDUSIND_SECTION_START: Regex = Regex::new(
        r"(?i)\bdate\b.*\btype\b.*\bdescription\b"
    ).unwrap();
    static ref INDUSIND_SECTION_END: Regex = Regex::new(
        r"(?i)^page\b|\bpage\s+\d+|computer generated"
    ).unwrap();

    // Transaction-type keywords
    static ref TRANSFER_CREDIT: Regex = Regex::new(r"(?i)\btransfer\s+credit\b").unwrap();
    static ref TRANSFER_DEBIT: Regex = Regex::new(r"(?i)\btransfer\s+debit\b").unwrap();
    static ref INTERNET_CREDIT: Regex = Regex::new(r"(?i)\binternet\s?credit\b").unwrap();
    static ref INTERNET_DEBIT: Regex = Regex::new(r"(?i)\binternet\s?debit\b").unwrap();
    static ref ACH_CREDIT: Regex = Regex::new(r"(?i)\bach\s+credit\b").unwrap();
    static ref ACH_DEBIT: Regex = Regex::new(r"(?i)\bach\s+debit\b").unwrap();
    static ref INTEREST_PAID: Regex = Regex::new(r"(?i)\bint\.?\s?pd\b").unwrap();
    static ref CREDIT_WORD: Regex = Regex::new(r"(?i)\bcredit\b").unwrap();

    static ref INR_PREFIX: Regex = Regex::new(r"(?i)\bINR\b").unwrap();
}

/// Characters OCR leaves from table rules and stamps.
const OCR_ARTIFACTS: [char; 3] = ['|', '=', '@'];

const ICICI_LEGENDS: &[&str] = &[
    "legends for transactions",
    "sincerely",
    "team icici",
    "summary of account",
    "category of service",
    "regd address",
    "page total",
    "this is a system-generated",
    "your details with us",
    "your base branch",
    "registration no",
    "pradhan mantri jan dhan yojana",
    "do not fall prey to fictitious offers",
    "code of commitment",
    "customers are requested to immediately notify",
];

const FEDERAL_BOILERPLATE: &[&str] = &[
    "federal bank ltd",
    "branch:",
    "www.federalbank.co.in",
    "cin:",
    "statement of account",
    "customer id",
    "account number",
    "account status",
    "abbreviations used",
    "disclaimer",
    "cash :",
    "tfr :",
    "ft :",
    "clg :",
    "sbint :",
    "mb :",
    "****end of statement****",
    "grand total",
];

/// Every built-in schema.
pub fn all() -> Vec<InstitutionSchema> {
    vec![
        canara(),
        sbi(),
        city_union(),
        federal(),
        icici(),
        kvb(),
        indusind(),
        indian_bank(),
    ]
}

/// Generic OCR layout: artifact cleanup, optional value date, reconciled amounts.
fn ocr_layout(anchor: &Regex) -> TokenScanLayout {
    let mut layout = TokenScanLayout::reconciling(anchor, AmountShape::Numeric);
    layout.strip_chars = OCR_ARTIFACTS.to_vec();
    layout.peel = vec![Peel::ValueDate];
    layout
}

fn text_layout(anchor: &Regex) -> TokenScanLayout {
    let mut layout = TokenScanLayout::reconciling(anchor, AmountShape::Decimal);
    layout.peel = vec![Peel::ValueDate];
    layout
}

fn phrases(list: &[&str]) -> Vec<NoiseRule> {
    list.iter().map(|p| NoiseRule::contains(p)).collect()
}

pub fn canara() -> InstitutionSchema {
    let mut schema = InstitutionSchema::new("canara", "Canara Bank");
    schema.aliases = &["canara bank", "canarabank"];
    schema.noise = phrases(&["ifsc code", "micr code", "account holders name"]);

    schema.table = Some(TableLayout::Positional(PositionalLayout {
        anchor: DATE_NUMERIC_LOOSE.clone(),
        min_cells: 5,
        skip_rows: vec![NoiseRule::pattern(&TXN_HEADER_ROW)],
        columns: vec![ColumnMap {
            min_width: 0,
            transaction_date: 0,
            value_date: Some(1),
            cheque: Some(2),
            description: 3,
            branch: Some(4),
            debit: 5,
            credit: 6,
            balance: 7,
        }],
        branch_digits: true,
    }));

    let mut text = TokenScanLayout::reconciling(&DATE_NUMERIC_LOOSE, AmountShape::Decimal);
    text.peel = vec![Peel::ValueDate, Peel::LabelledCheque];
    text.amounts = AmountLayout::Columns(vec![Slot::Credit, Slot::Debit, Slot::Balance]);
    schema.text = Some(text);

    schema.ocr = Some(ocr_layout(&DATE_NUMERIC_LOOSE));
    schema
}

pub fn sbi() -> InstitutionSchema {
    let mut schema = InstitutionSchema::new("sbi", "State Bank of India");
    schema.aliases = &["state bank of india", "statebank", "state bank"];
    schema.canonical_dates = true;

    schema.table = Some(TableLayout::Positional(PositionalLayout {
        anchor: NUMERIC_OR_NAMED_DATE.clone(),
        min_cells: 3,
        skip_rows: vec![
            NoiseRule::pattern(&TXN_HEADER_ROW),
            NoiseRule::pattern(&CLOSING_BALANCE),
        ],
        columns: vec![
            // Layout with a branch code column
            ColumnMap {
                min_width: 8,
                transaction_date: 0,
                value_date: Some(1),
                description: 2,
                cheque: Some(3),
                branch: Some(4),
                debit: 5,
                credit: 6,
                balance: 7,
            },
            ColumnMap {
                min_width: 0,
                transaction_date: 0,
                value_date: Some(1),
                description: 2,
                cheque: Some(3),
                branch: None,
                debit: 4,
                credit: 5,
                balance: 6,
            },
        ],
        branch_digits: false,
    }));

    schema.text = Some(text_layout(&NUMERIC_OR_NAMED_DATE));
    schema.ocr = Some(ocr_layout(&NUMERIC_OR_NAMED_DATE));
    schema
}

pub fn city_union() -> InstitutionSchema {
    let mut schema = InstitutionSchema::new("cub", "City Union Bank");
    schema.aliases = &["city union bank", "cityunion", "city_union"];

    schema.table = Some(TableLayout::Positional(PositionalLayout {
        anchor: DATE_NUMERIC_LOOSE.clone(),
        min_cells: 4,
        skip_rows: vec![
            NoiseRule::pattern(&CUB_HEADER_ROW),
            NoiseRule::pattern(&TOTAL_ROW),
        ],
        columns: vec![ColumnMap {
            min_width: 0,
            transaction_date: 0,
            value_date: None,
            description: 1,
            cheque: Some(2),
            branch: None,
            debit: 3,
            credit: 4,
            balance: 5,
        }],
        branch_digits: false,
    }));

    schema.text = Some(text_layout(&DATE_NUMERIC_LOOSE));
    schema.ocr = Some(ocr_layout(&DATE_NUMERIC_LOOSE));
    schema
}

pub fn federal() -> InstitutionSchema {
    let mut schema = InstitutionSchema::new("federal", "Federal Bank");
    schema.aliases = &["federal bank", "federalbank"];
    schema.noise = phrases(FEDERAL_BOILERPLATE);
    schema.noise.push(NoiseRule::pattern(&PAGE_HEADER));
    schema.description_scrubs = vec![FEDERAL_FOOTER.clone()];

    schema.table = Some(TableLayout::Positional(PositionalLayout {
        anchor: DATE_SLASHED.clone(),
        min_cells: 3,
        skip_rows: vec![NoiseRule::pattern(&TXN_HEADER_ROW)],
        columns: vec![ColumnMap {
            min_width: 0,
            transaction_date: 0,
            value_date: Some(1),
            description: 2,
            cheque: Some(5),
            branch: None,
            debit: 6,
            credit: 7,
            balance: 8,
        }],
        branch_digits: false,
    }));

    schema.text = Some(text_layout(&DATE_SLASHED));
    schema.ocr = Some(ocr_layout(&DATE_SLASHED));
    schema
}

pub fn icici() -> InstitutionSchema {
    let mut schema = InstitutionSchema::new("icici", "ICICI Bank");
    schema.aliases = &["icici bank", "icicibank"];
    schema.noise = phrases(ICICI_LEGENDS);
    schema.noise.extend([
        NoiseRule::pattern(&ICICI_SUMMARY),
        NoiseRule::pattern(&ICICI_SAVINGS_MASK),
        NoiseRule::pattern(&ICICI_CIN),
        NoiseRule::pattern(&ICICI_LEGEND),
        NoiseRule::pattern(&ICICI_PAGE_FOOTER),
    ]);
    schema.repairs = vec![Repair::InterestDates];
    schema.description_scrubs = vec![ICICI_INTIMATION.clone()];
    schema.type_keywords = vec![(INTEREST_PAID.clone(), Side::Credit)];
    schema.ocr_backfill = true;

    schema.table = Some(TableLayout::Sweep(SweepLayout {
        anchor: DASHED_CELL.clone(),
        skip_rows: vec![NoiseRule::pattern(&TXN_HEADER_ROW)],
    }));

    let footer = SectionRules {
        start: Vec::new(),
        end: vec![SectionMarker::stop(&ICICI_END)],
    };

    let mut text = text_layout(&DATE_DASHED);
    text.sections = footer.clone();
    schema.text = Some(text);

    let mut ocr = ocr_layout(&DATE_DASHED);
    ocr.sections = footer;
    ocr.peel = vec![
        Peel::Time,
        Peel::ValueDate,
        Peel::Branch { min: 1, max: 6 },
        Peel::Cheque { min: 10, max: 18 },
    ];
    schema.ocr = Some(ocr);
    schema
}

pub fn kvb() -> InstitutionSchema {
    let mut schema = InstitutionSchema::new("kvb", "Karur Vysya Bank");
    schema.aliases = &["karur vysya bank", "karurvysya"];

    let peel = vec![
        Peel::ValueDate,
        Peel::Branch { min: 1, max: 6 },
        Peel::Cheque { min: 10, max: 18 },
    ];
    let skip = vec![NoiseRule::pattern(&KVB_PAGE_NO), NoiseRule::pattern(&KVB_NOTE)];

    let mut text = TokenScanLayout::reconciling(&DATE_TIME_START, AmountShape::Decimal);
    text.peel = peel.clone();
    text.skip_lines = skip.clone();
    schema.text = Some(text);

    let mut ocr = ocr_layout(&DATE_TIME_START);
    ocr.peel = peel;
    ocr.skip_lines = skip;
    schema.ocr = Some(ocr);
    schema
}

pub fn indusind() -> InstitutionSchema {
    let mut schema = InstitutionSchema::new("indusind", "IndusInd Bank");
    schema.aliases = &["indusind bank", "induslnd"];
    schema.repairs = vec![Repair::InterestDates];
    schema.type_keywords = vec![
        (TRANSFER_CREDIT.clone(), Side::Credit),
        (TRANSFER_DEBIT.clone(), Side::Debit),
        (INTERNET_CREDIT.clone(), Side::Credit),
        (INTERNET_DEBIT.clone(), Side::Debit),
        (ACH_CREDIT.clone(), Side::Credit),
        (ACH_DEBIT.clone(), Side::Debit),
        (INTEREST_PAID.clone(), Side::Credit),
    ];

    let mut text = TokenScanLayout::reconciling(&DATE_DAY_MON_YEAR, AmountShape::Decimal);
    text.sections = SectionRules {
        start: vec![INDUSIND_SECTION_START.clone()],
        end: vec![SectionMarker::resume(&INDUSIND_SECTION_END)],
    };
    text.amount_scope = AmountScope::Block;
    text.amounts = AmountLayout::Columns(vec![Slot::Debit, Slot::Credit, Slot::Balance]);
    text.required_amounts = 2;
    schema.text = Some(text);

    schema.ocr = Some(ocr_layout(&DATE_DAY_MON_YEAR));
    schema
}

pub fn indian_bank() -> InstitutionSchema {
    let mut schema = InstitutionSchema::new("indian", "Indian Bank");
    schema.aliases = &["indian bank", "indianbank"];
    schema.type_keywords = vec![(CREDIT_WORD.clone(), Side::Credit)];

    let mut text = TokenScanLayout::reconciling(&DATE_DAY_MON_YEAR, AmountShape::Decimal);
    text.strip_patterns = vec![INR_PREFIX.clone()];
    text.amounts = AmountLayout::Columns(vec![Slot::Debit, Slot::Credit, Slot::Balance]);
    text.required_amounts = 2;
    text.close_on_page_break = true;
    schema.text = Some(text);

    let mut ocr = ocr_layout(&DATE_DAY_MON_YEAR);
    ocr.strip_patterns = vec![INR_PREFIX.clone()];
    ocr.close_on_page_break = true;
    schema.ocr = Some(ocr);
    schema
}
