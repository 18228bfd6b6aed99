//! HTML parser for search result pages
//!
//! This module turns a search page into:
//! - The page title (used to spot the bot-protection page)
//! - One [`Listing`] per listing container
//! - The search message box text (used to spot the end of results)

use crate::listing::Listing;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

// Selector literals are fixed, so a parse failure is a programming error
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    static ref TITLE: Selector = parse_selector!("title");
    static ref LISTING_CONTAINER: Selector =
        parse_selector!("div.listing.listing-search.listing-data");
    static ref LISTING_HEADING_LINK: Selector = parse_selector!("p.listing-heading a");
    static ref LISTING_ADDRESS: Selector = parse_selector!("p.listing-address");
    static ref CONTACT_PHONE: Selector = parse_selector!("span.contact-text");
    static ref CONTACT_EMAIL: Selector = parse_selector!("a.contact-email");
    static ref CONTACT_WEBSITE: Selector = parse_selector!("a.contact-url");
    static ref SEARCH_MESSAGE: Selector = parse_selector!("div.search-result-message");
}

/// A parsed search result page
///
/// Parsing never fails: malformed markup is repaired by the HTML parser and
/// missing elements simply come back as `None` or an empty list.
pub struct ListingDocument {
    document: Html,
}

impl ListingDocument {
    /// Parses a page body
    ///
    /// # Example
    ///
    /// ```
    /// use yp_harvest::crawler::ListingDocument;
    ///
    /// let doc = ListingDocument::parse("<html><head><title>Results</title></head></html>");
    /// assert_eq!(doc.title().as_deref(), Some("Results"));
    /// ```
    pub fn parse(body: &str) -> Self {
        Self {
            document: Html::parse_document(body),
        }
    }

    /// Text of the first `<title>` element, trimmed
    pub fn title(&self) -> Option<String> {
        self.document
            .select(&TITLE)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Extracts every listing container on the page
    ///
    /// `listing_url` is the page the containers came from and is stamped on
    /// each record.
    pub fn listings(&self, listing_url: &str) -> Vec<Listing> {
        self.document
            .select(&LISTING_CONTAINER)
            .map(|container| extract_listing(container, listing_url))
            .collect()
    }

    /// Text of the search message box, if the page has one
    pub fn search_message(&self) -> Option<String> {
        self.document
            .select(&SEARCH_MESSAGE)
            .next()
            .map(|element| element.text().collect::<String>())
    }

    /// True when the search message box contains `marker`
    pub fn has_no_results_message(&self, marker: &str) -> bool {
        self.search_message()
            .map(|text| text.contains(marker))
            .unwrap_or(false)
    }
}

/// Builds a listing from one container, leaving missing parts empty
fn extract_listing(container: ElementRef<'_>, listing_url: &str) -> Listing {
    let attrs = container.value();

    let description = find(container, &LISTING_HEADING_LINK).and_then(text_of);

    Listing {
        business_name: attrs.attr("data-full-name").map(str::to_string),
        description,
        post_code: attrs.attr("data-postcode").map(str::to_string),
        address: find(container, &LISTING_ADDRESS).and_then(text_of),
        phone: find(container, &CONTACT_PHONE).and_then(text_of),
        email: find(container, &CONTACT_EMAIL)
            .and_then(|a| a.value().attr("data-email"))
            .map(str::to_string),
        website: find(container, &CONTACT_WEBSITE)
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string),
        listing_url: listing_url.to_string(),
    }
}

/// First descendant of `scope` matching `selector`
fn find<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// Trimmed text content, `None` when blank
fn text_of(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://example.com/search/listings?pageNumber=1";

    fn full_listing() -> &'static str {
        r##"
        <div class="listing listing-search listing-data"
             data-full-name="Acme Handyman" data-postcode="2000">
            <p class="listing-heading"><a href="/acme">Repairs and maintenance</a></p>
            <p class="listing-address">1 George St, Sydney NSW 2000</p>
            <span class="contact-text">02 9999 0000</span>
            <a class="contact-email" data-email="hello@acme.example" href="#">Email</a>
            <a class="contact-url" href="https://acme.example">Website</a>
        </div>
        "##
    }

    #[test]
    fn test_selectors_compile() {
        for selector in [
            &*TITLE,
            &*LISTING_CONTAINER,
            &*LISTING_HEADING_LINK,
            &*LISTING_ADDRESS,
            &*CONTACT_PHONE,
            &*CONTACT_EMAIL,
            &*CONTACT_WEBSITE,
            &*SEARCH_MESSAGE,
        ] {
            let doc = Html::parse_fragment("<div></div>");
            assert_eq!(doc.select(selector).count(), 0);
        }
    }

    #[test]
    fn test_document_reused_across_calls() {
        let html = format!(
            "<html><head><title>Results</title></head><body>{}{}</body></html>",
            full_listing(),
            full_listing()
        );
        let doc = ListingDocument::parse(&html);

        let first = doc.listings(PAGE_URL);
        let second = doc.listings(PAGE_URL);
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(doc.title().as_deref(), Some("Results"));
    }

    #[test]
    fn test_extract_title() {
        let doc = ListingDocument::parse(
            "<html><head><title>  Yellow Pages® | Data Protection </title></head></html>",
        );
        assert_eq!(doc.title().as_deref(), Some("Yellow Pages® | Data Protection"));
    }

    #[test]
    fn test_no_title() {
        let doc = ListingDocument::parse("<html><head></head><body></body></html>");
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_extract_full_listing() {
        let html = format!("<html><body>{}</body></html>", full_listing());
        let listings = ListingDocument::parse(&html).listings(PAGE_URL);

        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.business_name.as_deref(), Some("Acme Handyman"));
        assert_eq!(listing.post_code.as_deref(), Some("2000"));
        assert_eq!(listing.description.as_deref(), Some("Repairs and maintenance"));
        assert_eq!(
            listing.address.as_deref(),
            Some("1 George St, Sydney NSW 2000")
        );
        assert_eq!(listing.phone.as_deref(), Some("02 9999 0000"));
        assert_eq!(listing.email.as_deref(), Some("hello@acme.example"));
        assert_eq!(listing.website.as_deref(), Some("https://acme.example"));
        assert_eq!(listing.listing_url, PAGE_URL);
    }

    #[test]
    fn test_missing_fields_are_none() {
        let html = r##"
            <html><body>
            <div class="listing listing-search listing-data" data-full-name="Bare Bones">
                <p class="listing-heading">No link here</p>
                <a class="contact-email" href="#">Email</a>
            </div>
            </body></html>
        "##;
        let listings = ListingDocument::parse(html).listings(PAGE_URL);

        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.business_name.as_deref(), Some("Bare Bones"));
        assert_eq!(listing.description, None);
        assert_eq!(listing.post_code, None);
        assert_eq!(listing.address, None);
        assert_eq!(listing.phone, None);
        assert_eq!(listing.email, None);
        assert_eq!(listing.website, None);
    }

    #[test]
    fn test_ignores_other_listing_blocks() {
        let html = format!(
            r#"<html><body>
            <div class="listing listing-search">advert</div>
            {}
            {}
            </body></html>"#,
            full_listing(),
            full_listing()
        );
        assert_eq!(ListingDocument::parse(&html).listings(PAGE_URL).len(), 2);
    }

    #[test]
    fn test_no_results_message() {
        let html = r#"<html><body>
            <div class="search-result-message">
                <p>No results found for Handyman in Nowhere</p>
            </div>
            </body></html>"#;
        let doc = ListingDocument::parse(html);
        assert!(doc.has_no_results_message("No results found for"));
        assert!(!doc.has_no_results_message("Did you mean"));
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let doc = ListingDocument::parse("<div class=\"listing listing-search listing-data\"<<<p>");
        assert!(doc.search_message().is_none());
        assert!(!doc.has_no_results_message("No results found for"));
        let _ = doc.listings(PAGE_URL);
    }
}
