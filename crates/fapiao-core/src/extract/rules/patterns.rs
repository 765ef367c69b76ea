//! Regex patterns for Chinese VAT invoice extraction.
//!
//! OCR linearizes the tabular invoice layout into a single text stream,
//! so every pattern is anchored on a label token rather than a position.
//! Cascades are evaluated most-specific first.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number: label followed by an 8-20 digit run
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"发票号码.*?(\d{8,20})"
    ).unwrap();

    // Date patterns
    pub static ref DATE_CJK: Regex = Regex::new(
        r"(\d{4}年\d{1,2}月\d{1,2}日)"
    ).unwrap();

    pub static ref DATE_COMPACT: Regex = Regex::new(
        r"(\d{8})"
    ).unwrap();

    pub static ref ISSUE_DATE_CJK: Regex = Regex::new(
        r"开票日期.*?(\d{4}年\d{1,2}月\d{1,2}日)"
    ).unwrap();

    pub static ref ISSUE_DATE_COMPACT: Regex = Regex::new(
        r"开票日期.*?(\d{8})"
    ).unwrap();

    // Amount patterns (价税合计 = total including tax)
    pub static ref TOTAL_WITH_CURRENCY: Regex = Regex::new(
        r"价税合计.*?¥\s*([\d,]+\.?\d*)"
    ).unwrap();

    pub static ref TOTAL_PLAIN: Regex = Regex::new(
        r"价税合计.*?([\d,]+\.?\d*)"
    ).unwrap();

    pub static ref SUBTOTAL_WITH_CURRENCY: Regex = Regex::new(
        r"合计.*?¥\s*([\d,]+\.?\d*)"
    ).unwrap();

    pub static ref GRAND_TOTAL_WITH_CURRENCY: Regex = Regex::new(
        r"总金额.*?¥\s*([\d,]+\.?\d*)"
    ).unwrap();

    // Content patterns. Starred form is "*category*item" as printed in
    // the goods column of electronic invoices.
    pub static ref CONTENT_STARRED_FULL: Regex = Regex::new(
        r"(\*[\u{4e00}-\u{9fa5}]+\*\S+)"
    ).unwrap();

    pub static ref CONTENT_STARRED: Regex = Regex::new(
        r"(\*[\u{4e00}-\u{9fa5}]+\*)"
    ).unwrap();

    pub static ref CONTENT_GOODS_LABEL: Regex = Regex::new(
        r"货物或应税劳务名称\s*[:：]?\s*([^\d¥\s]{2,50})"
    ).unwrap();

    pub static ref CONTENT_ITEM_LABEL: Regex = Regex::new(
        r"项目名称\s*[:：]?\s*([^\d¥\s]{2,50})"
    ).unwrap();

    // Seller name: company-suffixed CJK run first, any token as fallback
    pub static ref SELLER_COMPANY: Regex = Regex::new(
        r"销售方.*?名称\s*[:：]?\s*([\u{4e00}-\u{9fa5}]+(?:公司|中心|厂|店|行))"
    ).unwrap();

    pub static ref SELLER_ANY: Regex = Regex::new(
        r"销售方.*?名称\s*[:：]?\s*(\S+)"
    ).unwrap();

    // Bank patterns (开户行 = account-opening bank)
    pub static ref BANK_NAME: Regex = Regex::new(
        r"开户行\s*[:：]?\s*([^\s;；]+)"
    ).unwrap();

    pub static ref BANK_ACCOUNT: Regex = Regex::new(
        r"(?:银行)?账号.*?(\d{10,30})"
    ).unwrap();
}

/// Table-header words. A content candidate containing any of these
/// matched the column header row, not the goods column.
pub const HEADER_WORDS: [&str; 4] = ["规格", "单价", "单位", "数量"];

/// Labels that terminate a seller-name run. The capture is truncated at
/// the first occurrence of any of these (the regex crate has no
/// lookahead, so termination is applied after capture).
pub const SELLER_STOP_WORDS: [&str; 9] = [
    "购买方",
    "名称",
    "纳税人识别号",
    "统一社会信用代码",
    "地址",
    "电话",
    "备注",
    "账号",
    "开户行",
];
