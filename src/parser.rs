// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Turns short bookkeeping statements ("午餐 150", "花了三百元買衣服") into
//! structured transactions. Pure and deterministic: no I/O, only the fixed
//! keyword tables below are consulted.

use crate::models::Kind;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

pub const FALLBACK_CATEGORY: &str = "其他";

// Declaration order is the tie-break: the first category with a matching
// keyword wins.
pub const INCOME_KEYWORDS: &[(&str, &[&str])] = &[
    ("薪水", &["薪水", "薪資", "月薪", "工資"]),
    ("獎金", &["獎金", "年終", "分紅", "紅包"]),
    ("投資", &["股票", "股息", "利息", "投資", "基金"]),
];

pub const EXPENSE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "餐飲",
        &[
            "早餐", "午餐", "晚餐", "宵夜", "吃", "喝", "飲料", "咖啡", "茶", "餐", "便當", "外送",
            "美食",
        ],
    ),
    (
        "交通",
        &[
            "計程車", "uber", "捷運", "公車", "高鐵", "火車", "加油", "停車", "機車", "汽車",
            "交通",
        ],
    ),
    (
        "娛樂",
        &["電影", "遊戲", "唱歌", "ktv", "旅遊", "玩", "門票", "演唱會"],
    ),
    (
        "購物",
        &["買", "購", "衣服", "褲子", "鞋", "包包", "3c", "電腦", "手機", "網購"],
    ),
    (
        "生活",
        &["水電", "瓦斯", "房租", "電話費", "網路費", "日用品", "衛生紙"],
    ),
    ("醫療", &["看醫生", "藥", "醫院", "診所", "掛號", "健康"]),
];

static ARABIC_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:,\d{3})*(?:\.\d+)?)\s*(?:塊|元|錢|块)?").expect("invalid amount regex")
});

static CUED_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:花了?|用了?|付了?|收到?)\s*(\d+(?:,\d{3})*(?:\.\d+)?)")
        .expect("invalid cued amount regex")
});

static DECIMAL_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Nd}$").expect("invalid digit regex"));

static NUMERAL_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([零一二兩三四五六七八九十百千萬]+)\s*(?:塊|元|錢|块)?")
        .expect("invalid numeral regex")
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTransaction {
    pub kind: Kind,
    pub amount: Decimal,
    pub category: String,
    /// The input text, verbatim.
    pub description: String,
}

/// Parse a bookkeeping statement. `None` means no amount could be found and
/// the user should be asked to rephrase.
pub fn parse(text: &str) -> Option<ParsedTransaction> {
    if text.is_empty() {
        return None;
    }
    let amount = extract_amount(text).filter(|a| *a > Decimal::ZERO)?;
    let (kind, category) = classify(text);
    Some(ParsedTransaction {
        kind,
        amount,
        category: category.to_string(),
        description: text.to_string(),
    })
}

/// First monetary amount in `text`. Arabic numerals take priority over
/// Chinese numerals.
pub fn extract_amount(text: &str) -> Option<Decimal> {
    let text = normalize_digits(text);
    for re in [&*ARABIC_AMOUNT, &*CUED_AMOUNT] {
        if let Some(caps) = re.captures(&text) {
            if let Some(v) = parse_plain_number(&caps[1]) {
                return Some(v);
            }
        }
    }
    let caps = NUMERAL_RUN.captures(&text)?;
    chinese_to_number(&caps[1])
}

/// Interpret a run of Chinese numerals ("一百五十", "兩萬"). Returns `None`
/// when the run has no value, which includes a literal zero.
pub fn chinese_to_number(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    if let Some(v) = parse_plain_number(text) {
        return Some(v);
    }

    let mut result: u64 = 0;
    let mut segment: u64 = 0;
    for ch in text.chars() {
        if let Some(d) = numeral_digit(ch) {
            segment = if segment >= 10 {
                segment.checked_mul(10)?.checked_add(d)?
            } else {
                d
            };
        } else if let Some(marker) = numeral_marker(ch) {
            if segment == 0 {
                segment = 1;
            }
            if marker == 10_000 {
                result = result.checked_add(segment)?.checked_mul(marker)?;
            } else {
                result = result.checked_add(segment.checked_mul(marker)?)?;
            }
            segment = 0;
        }
        // currency units and anything else are skipped
    }

    match result.checked_add(segment)? {
        0 => None,
        v => Some(Decimal::from(v)),
    }
}

/// Income table first, then expense; `(Expense, 其他)` when nothing matches.
pub fn classify(text: &str) -> (Kind, &'static str) {
    let lowered = text.to_lowercase();
    for (kind, table) in [(Kind::Income, INCOME_KEYWORDS), (Kind::Expense, EXPENSE_KEYWORDS)] {
        for &(category, keywords) in table {
            if keywords.iter().any(|k| lowered.contains(*k)) {
                return (kind, category);
            }
        }
    }
    (Kind::Expense, FALLBACK_CATEGORY)
}

fn parse_plain_number(s: &str) -> Option<Decimal> {
    let clean: String = s.chars().filter(|c| *c != ',' && *c != '，').collect();
    Decimal::from_str(&clean).ok()
}

fn numeral_digit(ch: char) -> Option<u64> {
    let d = match ch {
        '零' => 0,
        '一' => 1,
        '二' | '兩' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        _ => return None,
    };
    Some(d)
}

fn numeral_marker(ch: char) -> Option<u64> {
    match ch {
        '十' => Some(10),
        '百' => Some(100),
        '千' => Some(1_000),
        '萬' => Some(10_000),
        _ => None,
    }
}

// Any decimal digit (full-width, Arabic-Indic, ...) reads as its ASCII
// counterpart, so the amount patterns only ever capture convertible text.
fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match digit_value(c) {
            Some(d) if !c.is_ascii_digit() => char::from(b'0' + d),
            _ => c,
        })
        .collect()
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

// Unicode allocates each decimal digit set as ten consecutive code points
// starting at zero, so a digit's value is its offset in its run.
fn digit_value(c: char) -> Option<u8> {
    if c.is_ascii_digit() {
        return Some(c as u8 - b'0');
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut start = c as u32;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    Some(((c as u32 - start) % 10) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn chinese_numeral_vectors() {
        assert_eq!(chinese_to_number("一百五十"), Some(dec("150")));
        assert_eq!(chinese_to_number("三千兩百"), Some(dec("3200")));
        assert_eq!(chinese_to_number("兩萬"), Some(dec("20000")));
        assert_eq!(chinese_to_number("十"), Some(dec("10")));
        assert_eq!(chinese_to_number("二十五"), Some(dec("25")));
        assert_eq!(chinese_to_number("一千零五"), Some(dec("1005")));
    }

    #[test]
    fn chinese_numeral_zero_is_no_value() {
        assert_eq!(chinese_to_number("零"), None);
        assert_eq!(chinese_to_number(""), None);
        assert_eq!(chinese_to_number("塊"), None);
    }

    #[test]
    fn chinese_numeral_prefers_plain_number() {
        assert_eq!(chinese_to_number("1,200"), Some(dec("1200")));
        assert_eq!(chinese_to_number("3，000"), Some(dec("3000")));
    }

    #[test]
    fn chinese_numeral_overflow_is_no_value() {
        assert_eq!(chinese_to_number("萬萬萬萬萬萬"), None);
    }

    #[test]
    fn arabic_numeral_wins_over_chinese() {
        assert_eq!(extract_amount("午餐150元"), Some(dec("150")));
        assert_eq!(extract_amount("三百 還是 250"), Some(dec("250")));
    }

    #[test]
    fn amount_with_separators_and_decimals() {
        assert_eq!(extract_amount("房租 12,500 元"), Some(dec("12500")));
        assert_eq!(extract_amount("咖啡 85.5"), Some(dec("85.5")));
        assert_eq!(extract_amount("午餐 １５０"), Some(dec("150")));
        // full-width punctuation is not a separator
        assert_eq!(extract_amount("咖啡 １２．５"), Some(dec("12")));
        assert_eq!(extract_amount("房租 １，２００"), Some(dec("1")));
    }

    #[test]
    fn other_script_digits_are_read() {
        assert_eq!(parse("午餐 ١٥٠").map(|p| p.amount), Some(dec("150")));
        assert_eq!(extract_amount("午餐 ١٥٠ 200"), Some(dec("150")));
        assert_eq!(extract_amount("咖啡 ४५"), Some(dec("45")));
        // the description keeps the original script
        assert_eq!(parse("午餐 ١٥٠").unwrap().description, "午餐 ١٥٠");
    }

    #[test]
    fn cue_pattern_rescues_unparsable_first_number() {
        assert_eq!(
            extract_amount("訂單 99999999999999999999999999999999 花了 200"),
            Some(dec("200"))
        );
        assert_eq!(extract_amount("訂單 99999999999999999999999999999999"), None);
        assert!(parse("訂單 99999999999999999999999999999999").is_none());
    }

    #[test]
    fn classify_uses_table_order() {
        // 薪水 is an income keyword, 吃 an expense one; income is checked first.
        assert_eq!(classify("吃飯 薪水"), (Kind::Income, "薪水"));
        // 餐飲 is declared before 購物.
        assert_eq!(classify("買早餐"), (Kind::Expense, "餐飲"));
        assert_eq!(classify("Uber 回家"), (Kind::Expense, "交通"));
        assert_eq!(classify("KTV"), (Kind::Expense, "娛樂"));
        assert_eq!(classify("還債"), (Kind::Expense, FALLBACK_CATEGORY));
    }

    #[test]
    fn parse_scenarios() {
        let p = parse("午餐150").unwrap();
        assert_eq!(p.kind, Kind::Expense);
        assert_eq!(p.amount, dec("150"));
        assert_eq!(p.category, "餐飲");
        assert_eq!(p.description, "午餐150");

        let p = parse("收入 薪水 50000").unwrap();
        assert_eq!(p.kind, Kind::Income);
        assert_eq!(p.amount, dec("50000"));
        assert_eq!(p.category, "薪水");
        assert_eq!(p.description, "收入 薪水 50000");

        let p = parse("花了三百元買衣服").unwrap();
        assert_eq!(p.kind, Kind::Expense);
        assert_eq!(p.amount, dec("300"));
        assert_eq!(p.category, "購物");

        let p = parse("還債500").unwrap();
        assert_eq!(p.kind, Kind::Expense);
        assert_eq!(p.amount, dec("500"));
        assert_eq!(p.category, FALLBACK_CATEGORY);
    }

    #[test]
    fn parse_rejects_text_without_amount() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("今天天氣很好"), None);
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn parse_rejects_zero_amount() {
        assert_eq!(parse("午餐 0"), None);
        assert_eq!(parse("午餐 0.00 元"), None);
    }

    #[test]
    fn parse_keeps_description_verbatim() {
        let text = "  晚餐 Uber Eats 320  ";
        let p = parse(text).unwrap();
        assert_eq!(p.description, text);
        assert_eq!(p.category, "餐飲");
    }

    #[test]
    fn parse_is_deterministic_and_positive() {
        let samples = [
            "午餐150",
            "收入 薪水 50000",
            "花了三百元買衣服",
            "今天天氣很好",
            "還債500",
            "一百五十",
            "看醫生 掛號 150",
            "年終 兩萬",
            "",
        ];
        for s in samples {
            let a = parse(s);
            assert_eq!(a, parse(s), "non-deterministic for {s:?}");
            if let Some(p) = a {
                assert!(p.amount > Decimal::ZERO, "non-positive amount for {s:?}");
                assert!(!p.category.is_empty());
            }
        }
    }

    #[test]
    fn unmatched_text_falls_back_to_other_expense() {
        let p = parse("雜支 42").unwrap();
        assert_eq!((p.kind, p.category.as_str()), (Kind::Expense, FALLBACK_CATEGORY));
    }
}
