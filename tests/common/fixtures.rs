//! Static feed documents used across harnesses.

/// A plain RSS 2.0 feed with two items and no namespaces.
pub const FEED_PLAIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Channel</title>
    <link>https://example.com</link>
    <description>Test Description</description>
    <item>
      <title>Test Item S01E01 HD</title>
      <link>https://example.com/items/1</link>
      <guid>12345</guid>
      <category>Test</category>
    </item>
    <item>
      <title>Other Show S02E10 1080p WEB</title>
      <link>https://example.com/items/2</link>
      <guid>67890</guid>
      <category>Drama</category>
      <description>Other Show 1080p x265</description>
    </item>
  </channel>
</rss>"#;

/// A feed mixing `atom:` and `media:` namespaced elements with plain ones.
pub const FEED_NAMESPACED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Namespaced</title>
    <link>https://example.com</link>
    <atom:link href="https://example.com/rss" rel="self" type="application/rss+xml"/>
    <item>
      <title>Episode</title>
      <link>https://example.com/e/1</link>
      <atom:link href="https://example.com/e/1.atom" rel="alternate"/>
      <media:title>Media title</media:title>
      <media:thumbnail url="https://example.com/1.jpg"/>
      <media:group>
        <media:thumbnail url="https://example.com/2.jpg"/>
        <link>https://example.com/nested</link>
      </media:group>
    </item>
  </channel>
</rss>"#;

/// An item whose title carries show, season and episode.
pub const FEED_EPISODE: &str = r#"<rss version="2.0">
  <channel>
    <title>Episodes</title>
    <item>
      <title>Show S01E02</title>
      <guid>1</guid>
    </item>
  </channel>
</rss>"#;

/// Payloads the parser must reject.
pub const MALFORMED: &[&str] = &[
    "This is not valid XML",
    "<rss><channel></rss>",
    "<rss><channel><title>unterminated",
    "<?xml version=\"1.0\"?>",
];
