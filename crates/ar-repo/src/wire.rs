//! Record Decoder (§4.7): decodes a block's CBOR payload into a typed
//! domain record when its `$type` tag matches a known schema.
//!
//! The wire shapes here mirror the AT Protocol lexicon exactly (camelCase
//! field names, `$type`-tagged embed unions, blob refs with a binary CID);
//! [`into_domain`] converts each into the plain Rust types in `ar_domain`.

use ar_domain::{
    BlobRef, Embed, Facet, FacetFeature, ImageEmbed, PostRecord, ProfileRecord, ReplyRef,
};
use cid::Cid;
use serde::Deserialize;

/// A record decoded from a block payload, or `Unknown` when the `$type`
/// tag doesn't match a recognized schema — not an error (§4.7).
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRecord {
    Profile(ProfileRecord),
    Post(PostRecord),
    Unknown,
}

#[derive(Deserialize)]
struct TypeTag {
    #[serde(rename = "$type")]
    type_: Option<String>,
}

/// Decode a block payload. Blocks whose `$type` is absent or unrecognized
/// decode as `Unknown` rather than failing — the archive may legitimately
/// contain collections this core doesn't model.
pub fn decode_record(data: &[u8]) -> ar_domain::Result<DecodedRecord> {
    let tag: TypeTag = match serde_ipld_dagcbor::from_slice(data) {
        Ok(t) => t,
        Err(_) => return Ok(DecodedRecord::Unknown),
    };

    match tag.type_.as_deref() {
        Some("app.bsky.actor.profile") => {
            let wire: WireProfile = serde_ipld_dagcbor::from_slice(data)
                .map_err(|e| ar_domain::Error::RepoParseFailed(format!("decoding profile: {e}")))?;
            Ok(DecodedRecord::Profile(wire.into_domain()))
        }
        Some("app.bsky.feed.post") => {
            let wire: WirePost = serde_ipld_dagcbor::from_slice(data)
                .map_err(|e| ar_domain::Error::RepoParseFailed(format!("decoding post: {e}")))?;
            Ok(DecodedRecord::Post(wire.into_domain()))
        }
        _ => Ok(DecodedRecord::Unknown),
    }
}

#[derive(Debug, Deserialize)]
struct WireBlobRef {
    #[serde(rename = "ref")]
    cid: WireCidLink,
    #[serde(rename = "mimeType")]
    mime_type: String,
    size: u64,
}

/// A blob's content address arrives as a raw CID (binary, tag 42 in
/// dag-cbor); `cid` deserializes that directly.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct WireCidLink(Cid);

impl WireBlobRef {
    fn into_domain(self) -> BlobRef {
        BlobRef {
            cid: self.cid.0.to_string(),
            mime_type: self.mime_type,
            size: self.size,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireProfile {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    description: Option<String>,
    avatar: Option<WireBlobRef>,
    banner: Option<WireBlobRef>,
    #[serde(rename = "createdAt")]
    created_at: Option<String>,
}

impl WireProfile {
    fn into_domain(self) -> ProfileRecord {
        ProfileRecord {
            display_name: self.display_name,
            description: self.description,
            avatar: self.avatar.map(WireBlobRef::into_domain),
            banner: self.banner.map(WireBlobRef::into_domain),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WirePost {
    text: String,
    #[serde(rename = "createdAt")]
    created_at: String,
    embed: Option<WireEmbed>,
    #[serde(default)]
    facets: Vec<WireFacet>,
    reply: Option<WireReplyRef>,
}

impl WirePost {
    fn into_domain(self) -> PostRecord {
        PostRecord {
            text: self.text,
            created_at: self.created_at,
            embed: self.embed.map(WireEmbed::into_domain),
            facets: self.facets.into_iter().map(WireFacet::into_domain).collect(),
            reply: self.reply.map(WireReplyRef::into_domain),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireReplyRef {
    root: WireStrongRef,
    parent: WireStrongRef,
}

impl WireReplyRef {
    fn into_domain(self) -> ReplyRef {
        ReplyRef {
            root_uri: self.root.uri,
            root_cid: self.root.cid,
            parent_uri: self.parent.uri,
            parent_cid: self.parent.cid,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireStrongRef {
    uri: String,
    cid: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "$type")]
enum WireEmbed {
    #[serde(rename = "app.bsky.embed.external")]
    External {
        external: WireExternal,
    },
    #[serde(rename = "app.bsky.embed.images")]
    Images { images: Vec<WireImageEmbed> },
    #[serde(rename = "app.bsky.embed.record")]
    Record { record: WireStrongRef },
    #[serde(rename = "app.bsky.embed.recordWithMedia")]
    RecordWithMedia {
        record: WireRecordEmbed,
        media: Box<WireEmbed>,
    },
}

#[derive(Debug, Deserialize)]
struct WireRecordEmbed {
    record: WireStrongRef,
}

#[derive(Debug, Deserialize)]
struct WireExternal {
    uri: String,
    title: String,
    description: String,
    thumb: Option<WireBlobRef>,
}

#[derive(Debug, Deserialize)]
struct WireImageEmbed {
    alt: Option<String>,
    image: WireBlobRef,
}

impl WireEmbed {
    fn into_domain(self) -> Embed {
        match self {
            WireEmbed::External { external } => Embed::External {
                uri: external.uri,
                title: external.title,
                description: external.description,
                thumb: external.thumb.map(WireBlobRef::into_domain),
            },
            WireEmbed::Images { images } => Embed::Images {
                images: images
                    .into_iter()
                    .map(|i| ImageEmbed {
                        alt: i.alt,
                        image: i.image.into_domain(),
                    })
                    .collect(),
            },
            WireEmbed::Record { record } => Embed::Record {
                uri: record.uri,
                cid: record.cid,
            },
            WireEmbed::RecordWithMedia { record, media } => Embed::RecordWithMedia {
                media: Box::new(media.into_domain()),
                record_uri: record.record.uri,
                record_cid: record.record.cid,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireFacet {
    index: WireByteSlice,
    features: Vec<WireFacetFeature>,
}

#[derive(Debug, Deserialize)]
struct WireByteSlice {
    #[serde(rename = "byteStart")]
    byte_start: u32,
    #[serde(rename = "byteEnd")]
    byte_end: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "$type")]
enum WireFacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: String },
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: String },
}

impl WireFacet {
    fn into_domain(self) -> Facet {
        Facet {
            byte_start: self.index.byte_start,
            byte_end: self.index.byte_end,
            features: self
                .features
                .into_iter()
                .map(|f| match f {
                    WireFacetFeature::Mention { did } => FacetFeature::Mention { sid: did },
                    WireFacetFeature::Link { uri } => FacetFeature::Link { uri },
                    WireFacetFeature::Tag { tag } => FacetFeature::Tag { tag },
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    fn encode<T: Serialize>(v: &T) -> Vec<u8> {
        serde_ipld_dagcbor::to_vec(v).unwrap()
    }

    #[derive(Serialize)]
    struct WirePostOut<'a> {
        #[serde(rename = "$type")]
        type_: &'a str,
        text: &'a str,
        #[serde(rename = "createdAt")]
        created_at: &'a str,
    }

    #[test]
    fn decodes_minimal_post() {
        let wire = WirePostOut {
            type_: "app.bsky.feed.post",
            text: "hello",
            created_at: "2024-01-01T00:00:00Z",
        };
        let decoded = decode_record(&encode(&wire)).unwrap();
        match decoded {
            DecodedRecord::Post(post) => {
                assert_eq!(post.text, "hello");
                assert!(post.embed.is_none());
                assert!(post.reply.is_none());
            }
            other => panic!("expected Post, got {other:?}"),
        }
    }

    #[derive(Serialize)]
    struct WireUnknownOut<'a> {
        #[serde(rename = "$type")]
        type_: &'a str,
        whatever: &'a str,
    }

    #[test]
    fn unrecognized_type_decodes_as_unknown() {
        let wire = WireUnknownOut {
            type_: "app.bsky.graph.follow",
            whatever: "x",
        };
        let decoded = decode_record(&encode(&wire)).unwrap();
        assert_eq!(decoded, DecodedRecord::Unknown);
    }

    #[test]
    fn missing_type_tag_decodes_as_unknown() {
        let decoded = decode_record(&encode(&serde_json::json!({"foo": "bar"}))).unwrap();
        assert_eq!(decoded, DecodedRecord::Unknown);
    }
}
