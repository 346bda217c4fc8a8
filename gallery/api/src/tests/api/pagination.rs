use crate::api::pagination::{Page, PageRequest};
use crate::store::Bounds;

#[test]
fn test_page_request() {
	assert_eq!(PageRequest::from_query(None), Some(PageRequest::Number(1)));
	assert_eq!(PageRequest::from_query(Some("sort=new")), Some(PageRequest::Number(1)));
	assert_eq!(PageRequest::from_query(Some("page=3")), Some(PageRequest::Number(3)));
	assert_eq!(PageRequest::from_query(Some("page=last")), Some(PageRequest::Last));

	for query in ["page=0", "page=-1", "page=abc", "page="] {
		assert_eq!(PageRequest::from_query(Some(query)), None, "{query}");
	}
}

#[test]
fn test_page_resolve() {
	let page = Page::resolve(PageRequest::Number(1), 25, 12).expect("first page");
	assert_eq!(page.num_pages, 3);
	assert!(page.has_next);
	assert!(!page.has_previous);
	assert_eq!(page.bounds(), Bounds::new(0, 12));

	let page = Page::resolve(PageRequest::Last, 25, 12).expect("last page");
	assert_eq!(page.number, 3);
	assert!(!page.has_next);
	assert!(page.has_previous);
	assert_eq!(page.bounds(), Bounds::new(24, 12));

	assert!(Page::resolve(PageRequest::Number(4), 25, 12).is_none());
}

#[test]
fn test_page_resolve_empty() {
	let page = Page::resolve(PageRequest::Number(1), 0, 12).expect("empty listings have a page");
	assert_eq!(page.num_pages, 1);
	assert_eq!(page.count, 0);
	assert!(!page.has_next);

	assert_eq!(Page::resolve(PageRequest::Last, 0, 12).map(|page| page.number), Some(1));
	assert!(Page::resolve(PageRequest::Number(2), 0, 12).is_none());
}

#[test]
fn test_page_serialize() {
	let page = Page::resolve(PageRequest::Number(2), 30, 10).expect("second page");
	assert_eq!(
		serde_json::to_value(page).expect("failed to serialize"),
		serde_json::json!({
			"number": 2,
			"num_pages": 3,
			"count": 30,
			"has_next": true,
			"has_previous": true,
		})
	);
}
