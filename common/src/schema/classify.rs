//! Sheet title classification.
//!
//! Titles are lower-cased and stripped of whitespace, then checked in a fixed
//! order: Users keywords (substring), Trade keywords (substring), then the
//! exact Assets names. The first group that matches decides the relation.

use crate::model::RelationTag;

/// Exact titles of sheets holding the asset relation, including the default
/// names a freshly created spreadsheet gets.
const ASSET_TITLES: &[&str] = &["assets", "자산현황", "자산", "현황", "sheet1", "시트1"];

const USER_KEYWORDS: &[&str] = &["user", "인사", "사용자", "사원"];

const TRADE_KEYWORDS: &[&str] = &["trade", "거래", "변동", "이력"];

fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

pub fn classify(title: &str) -> RelationTag {
    let title = normalize_title(title);
    if USER_KEYWORDS.iter().any(|k| title.contains(k)) {
        RelationTag::Users
    } else if TRADE_KEYWORDS.iter().any(|k| title.contains(k)) {
        RelationTag::Trade
    } else if ASSET_TITLES.contains(&title.as_str()) {
        RelationTag::Assets
    } else {
        RelationTag::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_titles_match_exactly_after_normalization() {
        assert_eq!(classify("Assets"), RelationTag::Assets);
        assert_eq!(classify(" Sheet 1 "), RelationTag::Assets);
        assert_eq!(classify("시트1"), RelationTag::Assets);
        assert_eq!(classify("자산 현황"), RelationTag::Assets);
        assert_eq!(classify("Assets 2024"), RelationTag::Unknown);
    }

    #[test]
    fn user_and_trade_keywords_match_as_substrings() {
        assert_eq!(classify("Users"), RelationTag::Users);
        assert_eq!(classify("HR_인사"), RelationTag::Users);
        assert_eq!(classify("사원 명부"), RelationTag::Users);
        assert_eq!(classify("거래이력"), RelationTag::Trade);
        assert_eq!(classify("Global_Trade"), RelationTag::Trade);
        assert_eq!(classify("자산 변동"), RelationTag::Trade);
    }

    #[test]
    fn users_take_priority_over_trade_and_assets() {
        // Contains both a user and a trade keyword.
        assert_eq!(classify("사용자 이력"), RelationTag::Users);
        // Contains a trade keyword; "assets" alone would be an exact match.
        assert_eq!(classify("assets trade"), RelationTag::Trade);
        assert_eq!(classify("user assets"), RelationTag::Users);
    }

    #[test]
    fn unrelated_titles_are_unknown() {
        assert_eq!(classify("Notes"), RelationTag::Unknown);
        assert_eq!(classify(""), RelationTag::Unknown);
    }
}
