//! Listing records extracted from search result pages

/// CSV column names, in output order
pub const LISTING_FIELDS: [&str; 8] = [
    "business_name",
    "description",
    "post_code",
    "address",
    "ph",
    "email",
    "website",
    "listing_url",
];

/// A single business listing scraped from a search result page
///
/// Every field except `listing_url` is optional: the directory omits
/// contact details freely and a missing node is not an error. The field
/// order matches [`LISTING_FIELDS`] and is the CSV column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Full business name (`data-full-name`)
    pub business_name: Option<String>,

    /// Short description from the listing heading
    pub description: Option<String>,

    /// Postal code (`data-postcode`)
    pub post_code: Option<String>,

    /// Street address
    pub address: Option<String>,

    /// Phone number (the `ph` column)
    pub phone: Option<String>,

    /// Contact email (`data-email`)
    pub email: Option<String>,

    /// Business website
    pub website: Option<String>,

    /// URL of the search page this listing was found on
    pub listing_url: String,
}

impl Listing {
    /// Creates an empty listing for the given page URL
    pub fn new(listing_url: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.into(),
            ..Default::default()
        }
    }

    /// Row values in CSV column order, with absent fields as empty strings
    pub fn to_row(&self) -> [&str; 8] {
        [
            self.business_name.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
            self.post_code.as_deref().unwrap_or(""),
            self.address.as_deref().unwrap_or(""),
            self.phone.as_deref().unwrap_or(""),
            self.email.as_deref().unwrap_or(""),
            self.website.as_deref().unwrap_or(""),
            &self.listing_url,
        ]
    }
}
