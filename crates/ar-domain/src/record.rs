//! Typed repository records (§3) and the derived searchable-text
//! projection consumed by the search engine (§4.7).

use serde::{Deserialize, Serialize};

use crate::sid::Sid;

/// `app.bsky.actor.profile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProfileRecord {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<BlobRef>,
    pub banner: Option<BlobRef>,
    pub created_at: Option<String>,
}

/// A blob reference, displayed with its content address transcoded to a
/// base-N string (§3, §4.7) rather than the raw binary CID bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobRef {
    pub cid: String,
    pub mime_type: String,
    pub size: u64,
}

/// `app.bsky.feed.post`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub text: String,
    pub created_at: String,
    pub embed: Option<Embed>,
    #[serde(default)]
    pub facets: Vec<Facet>,
    pub reply: Option<ReplyRef>,
}

/// Reply reference: root and parent post, each as (uri, cid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub root_uri: String,
    pub root_cid: String,
    pub parent_uri: String,
    pub parent_cid: String,
}

/// The four embed shapes named in §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Embed {
    External {
        uri: String,
        title: String,
        description: String,
        thumb: Option<BlobRef>,
    },
    Images {
        images: Vec<ImageEmbed>,
    },
    Record {
        uri: String,
        cid: String,
    },
    RecordWithMedia {
        media: Box<Embed>,
        record_uri: String,
        record_cid: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEmbed {
    pub alt: Option<String>,
    pub image: BlobRef,
}

/// A byte-range annotation over post text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub byte_start: u32,
    pub byte_end: u32,
    pub features: Vec<FacetFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FacetFeature {
    Mention { sid: String },
    Link { uri: String },
    Tag { tag: String },
}

impl PostRecord {
    /// The union of text, embed text, and link-facet URIs used for
    /// matching (§4.7). Quoted-record embeds contribute nothing — their
    /// text lives in another record.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.text.as_str()];

        if let Some(embed) = &self.embed {
            embed.collect_searchable_text(&mut parts);
        }

        for facet in &self.facets {
            for feature in &facet.features {
                if let FacetFeature::Link { uri } = feature {
                    parts.push(uri.as_str());
                }
            }
        }

        parts
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Embed {
    fn collect_searchable_text<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Embed::External {
                title, description, ..
            } => {
                out.push(title.as_str());
                out.push(description.as_str());
            }
            Embed::Images { images } => {
                for image in images {
                    if let Some(alt) = &image.alt {
                        out.push(alt.as_str());
                    }
                }
            }
            Embed::Record { .. } => {}
            Embed::RecordWithMedia { media, .. } => media.collect_searchable_text(out),
        }
    }
}

/// Build the canonical record URI `at://<sid>/<collection>/<rkey>`.
pub fn record_uri(sid: &Sid, collection: &str, rkey: &str) -> String {
    format!("at://{sid}/{collection}/{rkey}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(size: u64) -> BlobRef {
        BlobRef {
            cid: "bafy...".into(),
            mime_type: "image/png".into(),
            size,
        }
    }

    #[test]
    fn searchable_text_includes_post_text() {
        let post = PostRecord {
            text: "hello world".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            embed: None,
            facets: vec![],
            reply: None,
        };
        assert_eq!(post.searchable_text(), "hello world");
    }

    #[test]
    fn searchable_text_includes_image_alts() {
        let post = PostRecord {
            text: "look at this".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            embed: Some(Embed::Images {
                images: vec![
                    ImageEmbed {
                        alt: Some("a cat".into()),
                        image: blob(10),
                    },
                    ImageEmbed {
                        alt: None,
                        image: blob(20),
                    },
                ],
            }),
            facets: vec![],
            reply: None,
        };
        assert_eq!(post.searchable_text(), "look at this a cat");
    }

    #[test]
    fn searchable_text_includes_external_embed_title_and_description() {
        let post = PostRecord {
            text: "check this out".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            embed: Some(Embed::External {
                uri: "https://example.com".into(),
                title: "Example Title".into(),
                description: "Example description".into(),
                thumb: None,
            }),
            facets: vec![],
            reply: None,
        };
        assert_eq!(
            post.searchable_text(),
            "check this out Example Title Example description"
        );
    }

    #[test]
    fn searchable_text_excludes_quoted_record_text() {
        let post = PostRecord {
            text: "quoting".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            embed: Some(Embed::Record {
                uri: "at://did:plc:abc/app.bsky.feed.post/xyz".into(),
                cid: "bafy...".into(),
            }),
            facets: vec![],
            reply: None,
        };
        assert_eq!(post.searchable_text(), "quoting");
    }

    #[test]
    fn searchable_text_recurses_into_composite_media() {
        let post = PostRecord {
            text: "combo".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            embed: Some(Embed::RecordWithMedia {
                media: Box::new(Embed::Images {
                    images: vec![ImageEmbed {
                        alt: Some("nested alt".into()),
                        image: blob(5),
                    }],
                }),
                record_uri: "at://did:plc:abc/app.bsky.feed.post/xyz".into(),
                record_cid: "bafy...".into(),
            }),
            facets: vec![],
            reply: None,
        };
        assert_eq!(post.searchable_text(), "combo nested alt");
    }

    #[test]
    fn searchable_text_includes_link_facet_uris() {
        let post = PostRecord {
            text: "see link".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            embed: None,
            facets: vec![Facet {
                byte_start: 4,
                byte_end: 8,
                features: vec![
                    FacetFeature::Link {
                        uri: "https://example.com/page".into(),
                    },
                    FacetFeature::Mention {
                        sid: "did:plc:5cajdgeo6qz32kptlpg4c3lv".into(),
                    },
                ],
            }],
            reply: None,
        };
        assert_eq!(post.searchable_text(), "see link https://example.com/page");
    }

    #[test]
    fn record_uri_format() {
        let sid = Sid::parse("did:plc:5cajdgeo6qz32kptlpg4c3lv").unwrap();
        assert_eq!(
            record_uri(&sid, "app.bsky.feed.post", "3jzfcijpj2z2a"),
            "at://did:plc:5cajdgeo6qz32kptlpg4c3lv/app.bsky.feed.post/3jzfcijpj2z2a"
        );
    }
}
