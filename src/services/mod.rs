use sea_orm::sea_query::LikeExpr;

pub mod album;
pub mod playlist;
pub mod song;

/// `LIKE` pattern matching `text` anywhere, with `%`, `_` and `\` taken literally.
pub(crate) fn contains_literal(text: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');

    LikeExpr::new(pattern).escape('\\')
}
