// SPDX-License-Identifier: PMPL-1.0-or-later
//! Listing helpers used by the project and news pages: pagination,
//! category filtering and URL slugs.

use crate::models::Article;
use serde::Serialize;
use uuid::Uuid;

/// One page of a listing (pages are 1-based)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice `items` into the requested page, clamping out-of-range pages.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);

    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Articles in the given category; `None` keeps everything.
pub fn filter_by_category(articles: &[Article], category_id: Option<Uuid>) -> Vec<Article> {
    match category_id {
        None => articles.to_vec(),
        Some(id) => articles
            .iter()
            .filter(|a| a.category_id == Some(id))
            .cloned()
            .collect(),
    }
}

/// Build a URL slug: lower case ASCII, diacritics folded, words joined by `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.to_lowercase().chars().map(fold_diacritic) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ' | 'ẩ'
        | 'ẫ' | 'ậ' | 'ä' | 'å' => 'a',
        'đ' => 'd',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' | 'ë' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ' | 'ở'
        | 'ỡ' | 'ợ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' | 'û' | 'ü' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' | 'ÿ' => 'y',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_middle_and_last_page() {
        let items: Vec<u32> = (1..=23).collect();

        let page = paginate(&items, 2, 10);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);

        let last = paginate(&items, 3, 10);
        assert_eq!(last.items, vec![21, 22, 23]);
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        let items = vec!['a', 'b', 'c'];

        assert_eq!(paginate(&items, 0, 2).page, 1);
        let beyond = paginate(&items, 9, 2);
        assert_eq!(beyond.page, 2);
        assert_eq!(beyond.items, vec!['c']);
    }

    #[test]
    fn test_paginate_empty_listing() {
        let items: Vec<u8> = Vec::new();
        let page = paginate(&items, 1, 6);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 0);
    }

    #[test]
    fn test_slugify_folds_vietnamese() {
        assert_eq!(slugify("Thiết kế Thương hiệu Đẹp"), "thiet-ke-thuong-hieu-dep");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("  Hello, World!! 2026 "), "hello-world-2026");
        assert_eq!(slugify("---"), "");
    }
}
