use serde::Serialize;
use serde_json::Value;

use crate::schema::{response_schema, REQUIRED_CATEGORIES};

/// Checks the provider is asked to perform, grouped by the category they feed.
pub const CHECKS: &[(&str, &str)] = &[
    ("meta", "Title Tag: check presence. Ideal length: 50-60 characters."),
    ("meta", "Meta Description: check presence. Ideal length: 120-160 characters."),
    ("meta", "Meta Keywords: check presence. Note that the tag is mostly obsolete."),
    ("meta", "Canonical URL: check for a rel=\"canonical\" link."),
    ("meta", "Favicon: check for rel=\"icon\" or an equivalent link."),
    ("content", "Word Count: count words in the main content area. Warn if fewer than 300 words."),
    ("content", "Language Attribute: check for a 'lang' attribute on <html>."),
    ("structure", "Heading Structure: check for a single H1 and a logical order of H2s and H3s."),
    ("structure", "Open Graph & Twitter Tags: check for key tags such as og:title, og:description and twitter:card."),
    ("links", "Internal vs External Links: count both types of links."),
    ("links", "Image Alt Attributes: inspect every <img> tag and report the percentage with non-empty alt text."),
    ("mobile", "Viewport Meta Tag: check for a valid viewport meta tag for mobile responsiveness."),
    ("technical", "HTTPS Check: verify the URL uses the HTTPS scheme."),
    ("technical", "Robots.txt: check whether [domain]/robots.txt is accessible and valid."),
    ("technical", "Sitemap.xml: check whether [domain]/sitemap.xml is accessible."),
];

/// Everything sent to the provider for one URL, independent of provider and model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    /// Natural-language instruction with the target URL embedded verbatim.
    pub instruction: String,
    /// Structured-output constraint matching [`crate::schema::validate`].
    pub response_schema: Value,
}

/// Build the analysis request for `url`.
///
/// Pure: the same URL always yields byte-identical instruction text. The URL is
/// interpolated as given; normalization happens before this point.
pub fn build_request(url: &str) -> AnalysisRequest {
    AnalysisRequest {
        instruction: instruction(url),
        response_schema: response_schema(),
    }
}

fn instruction(url: &str) -> String {
    let mut text = String::with_capacity(2048);
    text.push_str(
        "You are an expert SEO analysis tool. Analyze the page at the URL below and return a detailed SEO report.\n",
    );
    text.push_str(
        "Respond with a single JSON object only. Do not include any explanatory text, prose, or markdown outside the JSON object.\n",
    );
    text.push_str("The URL to analyze is: ");
    text.push_str(url);
    text.push_str("\n\n");

    text.push_str("The JSON object must contain exactly these category keys: ");
    text.push_str(&REQUIRED_CATEGORIES.join(", "));
    text.push_str(".\n");
    text.push_str(
        "Each category has a 'title' (string), a 'score' (integer from 0 to 100 based on SEO best practices) and an 'items' array.\n",
    );
    text.push_str(
        "Each item has 'id', 'name', 'status', 'value', 'description' and 'guidance' string fields.\n\n",
    );

    text.push_str("Guidelines for checks:\n");
    for key in REQUIRED_CATEGORIES {
        for (_, check) in CHECKS.iter().filter(|(category, _)| *category == key) {
            text.push_str("- [");
            text.push_str(key);
            text.push_str("] ");
            text.push_str(check);
            text.push('\n');
        }
    }
    text.push('\n');
    text.push_str("For each item, 'status' must be exactly one of 'pass', 'warn', or 'fail'.\n");
    text
}
