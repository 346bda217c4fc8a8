use crate::store::Bounds;

/// The `page` query parameter: a 1-based number or `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
	Number(u64),
	Last,
}

impl Default for PageRequest {
	fn default() -> Self {
		Self::Number(1)
	}
}

impl PageRequest {
	/// `None` when the parameter is present but not a valid page.
	pub fn from_query(query: Option<&str>) -> Option<Self> {
		let Some(page) = query.and_then(|query| {
			url::form_urlencoded::parse(query.as_bytes())
				.find(|(key, _)| key == "page")
				.map(|(_, value)| value.into_owned())
		}) else {
			return Some(Self::default());
		};

		if page == "last" {
			return Some(Self::Last);
		}

		page.parse::<u64>().ok().filter(|n| *n >= 1).map(Self::Number)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Page {
	pub number: u64,
	pub num_pages: u64,
	pub count: u64,
	pub has_next: bool,
	pub has_previous: bool,
	#[serde(skip)]
	per_page: u64,
}

impl Page {
	/// Resolves a request against `count` items. An empty listing still has
	/// a first page, any other page past the end is `None`.
	pub fn resolve(request: PageRequest, count: u64, per_page: u64) -> Option<Self> {
		let per_page = per_page.max(1);
		let num_pages = count.div_ceil(per_page).max(1);

		let number = match request {
			PageRequest::Number(number) => number,
			PageRequest::Last => num_pages,
		};

		if number == 0 || number > num_pages {
			return None;
		}

		Some(Self {
			number,
			num_pages,
			count,
			has_next: number < num_pages,
			has_previous: number > 1,
			per_page,
		})
	}

	pub fn bounds(&self) -> Bounds {
		Bounds::new((self.number - 1) * self.per_page, self.per_page)
	}
}
