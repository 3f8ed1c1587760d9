use serde::{Deserialize, Serialize};

use super::decode::NormalizedRecord;
use super::normalize::normalize_key;

/// The two row families an export can carry: daily account-level metrics or
/// per-post metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Overview,
    Content,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Overview => "overview",
            SchemaKind::Content => "content",
        }
    }
}

/// Classifier markers and alias vocabulary, kept as data rather than
/// literals inside the algorithms so a new exporter's column names are a
/// table edit, not a code change. `AppState` holds the production instance;
/// tests inject their own.
#[derive(Debug, Clone)]
pub struct IngestRules {
    /// Columns that only account-overview exports carry.
    pub overview_markers: Vec<String>,
    /// The impressions column family, present in both schemas.
    pub impression_keys: Vec<String>,
    /// Columns that only content exports carry (post text variants).
    pub text_keys: Vec<String>,
    pub aliases: AliasTable,
}

/// Ordered alias lists, one per logical field. Order is part of the
/// contract: when a row redundantly carries both the Spanish and the
/// English spelling, the first listed alias wins.
#[derive(Debug, Clone)]
pub struct AliasTable {
    pub date: Vec<String>,
    pub published_at: Vec<String>,
    pub post_id: Vec<String>,
    pub text: Vec<String>,
    pub url: Vec<String>,
    pub impressions: Vec<String>,
    pub likes: Vec<String>,
    pub interactions: Vec<String>,
    pub saves: Vec<String>,
    pub shares: Vec<String>,
    pub new_followers: Vec<String>,
    pub unfollows: Vec<String>,
    pub replies: Vec<String>,
    pub reposts: Vec<String>,
    pub profile_visits: Vec<String>,
    pub posts_created: Vec<String>,
    pub video_plays: Vec<String>,
    pub media_views: Vec<String>,
    pub detail_expands: Vec<String>,
    pub url_clicks: Vec<String>,
    pub hashtag_clicks: Vec<String>,
    pub permalink_clicks: Vec<String>,
}

fn keys(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|k| k.to_string()).collect()
}

impl Default for IngestRules {
    fn default() -> Self {
        IngestRules {
            overview_markers: keys(&[
                "nuevos_seguidores",
                "dejar_de_seguir",
                "new_followers",
                "unfollows",
                "create_post",
            ]),
            impression_keys: keys(&["impresiones", "impressions"]),
            text_keys: keys(&["texto_post", "texto_del_post", "text", "content"]),
            aliases: AliasTable::default(),
        }
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        AliasTable {
            date: keys(&["date", "fecha"]),
            published_at: keys(&["fecha", "date", "published_at", "publishedat"]),
            post_id: keys(&["post_id", "id_del_post", "id", "tweet_id", "postid"]),
            text: keys(&["texto_del_post", "texto_post", "text", "content"]),
            url: keys(&["postear_enlace", "url_post", "url", "permalink"]),
            impressions: keys(&["impresiones", "impressions"]),
            likes: keys(&["me_gusta", "likes"]),
            interactions: keys(&[
                "interacciones",
                "interactions",
                "engagement",
                "engagement_rate",
            ]),
            saves: keys(&["guardados", "saves"]),
            shares: keys(&["compartidos", "shares", "retweets"]),
            new_followers: keys(&["nuevos_seguidores", "new_followers"]),
            unfollows: keys(&["dejar_de_seguir", "unfollows"]),
            replies: keys(&["respuestas", "replies", "comments"]),
            reposts: keys(&["reposts"]),
            profile_visits: keys(&[
                "visitas_del_perfil",
                "visitas_perfil",
                "profile_visits",
            ]),
            posts_created: keys(&["create_post"]),
            video_plays: keys(&[
                "reproducciones_de_video",
                "reproducciones_video",
                "video_plays",
                "video_views",
            ]),
            media_views: keys(&[
                "visualizaciones_de_contenido_multimedia",
                "visualizaciones_multimedia",
                "media_views",
            ]),
            detail_expands: keys(&["detail_expands", "detail_expansions"]),
            url_clicks: keys(&["url_clicks", "link_clicks"]),
            hashtag_clicks: keys(&["hashtag_clicks"]),
            permalink_clicks: keys(&["permalink_clicks"]),
        }
    }
}

/// Classifies a decoded file as overview or content. Runs once per file,
/// against the first record; later rows do not get a vote.
///
/// Overview and content exports share several metric columns, so the rules
/// check schema-exclusive columns before the weaker "impressions but no
/// text" signal. First match wins:
///
/// 1. the file name mentions overview;
/// 2. an overview-only marker column is present;
/// 3. an impressions column is present and no text column is;
/// 4. otherwise content.
pub fn classify(
    rules: &IngestRules,
    file_name: &str,
    first: Option<&NormalizedRecord>,
) -> SchemaKind {
    if file_name.to_lowercase().contains("overview") {
        return SchemaKind::Overview;
    }

    let Some(record) = first else {
        // Nothing was decoded, so the column rules cannot match.
        return SchemaKind::Content;
    };

    if has_any(record, &rules.overview_markers) {
        return SchemaKind::Overview;
    }
    if has_any(record, &rules.impression_keys) && !has_any(record, &rules.text_keys) {
        return SchemaKind::Overview;
    }

    SchemaKind::Content
}

/// Key presence is the signal; an empty cell under the key still counts.
fn has_any(record: &NormalizedRecord, candidates: &[String]) -> bool {
    candidates
        .iter()
        .any(|key| record.contains_key(&normalize_key(key)))
}
