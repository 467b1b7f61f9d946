//! Card field extraction.
//!
//! Narrows a detail page down to its card section and info box, then hands
//! the label and entry texts to [`CardLayout`] for field assembly.

use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::{CardId, CardRecord, ExtractConfig, LabelVocabulary};
use crate::services::layout::CardLayout;
use crate::utils::html::{parse_selector, select_visible, stripped_text};

/// Compiled selectors for one page template.
#[derive(Debug, Clone)]
struct CompiledSelectors {
    section: Selector,
    heading: Selector,
    info_box: Selector,
    decoration: Selector,
    label: Selector,
    entry: Selector,
}

/// Extracts card records from detail page HTML.
#[derive(Debug, Clone)]
pub struct CardExtractor {
    selectors: CompiledSelectors,
    labels: LabelVocabulary,
}

impl CardExtractor {
    /// Compile the configured selectors.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let s = &config.selectors;
        Ok(Self {
            selectors: CompiledSelectors {
                section: parse_selector(&s.section)?,
                heading: parse_selector(&s.heading)?,
                info_box: parse_selector(&s.info_box)?,
                decoration: parse_selector(&s.decoration)?,
                label: parse_selector(&s.label)?,
                entry: parse_selector(&s.entry)?,
            },
            labels: config.labels.clone(),
        })
    }

    pub fn labels(&self) -> &LabelVocabulary {
        &self.labels
    }

    /// Extract a record from a raw page.
    ///
    /// Returns `None` when the page does not have exactly one card section,
    /// or when the section lacks its heading or info box.
    pub fn extract(&self, id: CardId, raw: &str) -> Option<CardRecord> {
        let document = Html::parse_document(raw);
        let sel = &self.selectors;

        let sections: Vec<_> = document.select(&sel.section).collect();
        let [section] = sections.as_slice() else {
            log::warn!(
                "Card {id}: expected one card section, found {}; skipping",
                sections.len()
            );
            return None;
        };
        let section = *section;

        let Some(heading) = section.select(&sel.heading).next() else {
            log::warn!("Card {id}: card section has no name heading; skipping");
            return None;
        };
        let name = stripped_text(heading, heading, None);

        let Some(info_box) = section.select(&sel.info_box).next() else {
            log::warn!("Card {id}: card section has no info box; skipping");
            return None;
        };

        let texts = |selector: &Selector| -> Vec<String> {
            select_visible(info_box, selector, &sel.decoration)
                .into_iter()
                .map(|el| stripped_text(el, info_box, Some(&sel.decoration)))
                .collect()
        };
        let labels = texts(&sel.label);
        let entries = texts(&sel.entry);

        let layout = CardLayout::classify(&labels, &self.labels);
        if layout == CardLayout::Unrecognized {
            log::debug!("Card {id}: unrecognized labels {labels:?}");
        }
        let fields = layout.assemble(&entries, &self.labels);

        Some(CardRecord::new(id, name, fields.ability, fields.attack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> CardExtractor {
        CardExtractor::new(&ExtractConfig::default()).unwrap()
    }

    /// Wrap an info box body in a minimal detail page.
    fn page(name: &str, info_box: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html><body>
<div class="Header"><h1 class="Heading1">Card search</h1></div>
<section class="Section">
  <h1 class="Heading1 mt20"> {name} </h1>
  <div class="LeftBox"><img src="card.png"></div>
  <div class="RightBox">
    <div class="RightBox-inner">
{info_box}
    </div>
  </div>
</section>
</body></html>"#
        )
    }

    #[test]
    fn test_ability_card() {
        let html = page(
            "ピカチュウex",
            r#"
      <h2 class="mt20">特性</h2>
      <h4>がんばりハート</h4>
      <p>このポケモンがきぜつするダメージを受けても...</p>
      <h2 class="mt20">ワザ</h2>
      <h4><span class="icon-electric icon"></span>トパーズボルト<span class="f_right Text-fjalla">300</span></h4>
      <h4>でんきショック<span class="f_right Text-fjalla">30</span></h4>
"#,
        );

        let record = extractor().extract(CardId(46141), &html).unwrap();
        assert_eq!(
            record,
            CardRecord::new(
                CardId(46141),
                "ピカチュウex",
                "がんばりハート",
                "トパーズボルト/でんきショック"
            )
        );
    }

    #[test]
    fn test_move_card() {
        let html = page(
            "ヒトカゲ",
            r#"
      <h2 class="mt20">ワザ</h2>
      <h4>ひのこ<span class="f_right Text-fjalla">10</span></h4>
      <h4>しっぽをふる</h4>
      <h4>かえんほうしゃ<span class="f_right Text-fjalla">60</span></h4>
      <h2 class="mt20">弱点・抵抗力・にげる</h2>
"#,
        );

        let record = extractor().extract(CardId(1), &html).unwrap();
        assert_eq!(record.name, "ヒトカゲ");
        assert_eq!(record.ability, "");
        assert_eq!(record.attack, "ひのこ/しっぽをふる/かえんほうしゃ");
    }

    #[test]
    fn test_vstar_power_card() {
        let html = page(
            "アルセウスVSTAR",
            r#"
      <h2 class="mt20">ワザ</h2>
      <h4>トリニティノヴァ<span class="f_right Text-fjalla">200</span></h4>
      <h2 class="mt20">VSTARパワー</h2>
      <h4>特性</h4>
      <h4>スターバース</h4>
      <h4 class="hidden">ignored</h4>
"#,
        );

        let record = extractor().extract(CardId(2), &html).unwrap();
        assert_eq!(record.ability, "スターバース");
        assert_eq!(record.attack, "トリニティノヴァ");
    }

    #[test]
    fn test_vstar_power_move_card() {
        let html = page(
            "ギラティナVSTAR",
            r#"
      <h2 class="mt20">ワザ</h2>
      <h4>アビスシーク</h4>
      <h4>シャドーインパクト<span class="f_right Text-fjalla">280</span></h4>
      <h2 class="mt20">VSTARパワー</h2>
      <h4>ワザ</h4>
      <h4>スターレクイエム</h4>
"#,
        );

        let record = extractor().extract(CardId(3), &html).unwrap();
        assert_eq!(record.ability, "");
        assert_eq!(record.attack, "アビスシークシャドーインパクト/スターレクイエム");
    }

    #[test]
    fn test_unrecognized_labels_still_produce_record() {
        let html = page(
            "ふしぎなアメ",
            r#"
      <h2 class="mt20">グッズ</h2>
      <h4>ignored</h4>
"#,
        );

        let record = extractor().extract(CardId(4), &html).unwrap();
        assert_eq!(record, CardRecord::new(CardId(4), "ふしぎなアメ", "", ""));
    }

    #[test]
    fn test_no_section_returns_none() {
        let html = "<html><body><p>カードが見つかりません</p></body></html>";
        assert_eq!(extractor().extract(CardId(5), html), None);
    }

    #[test]
    fn test_two_sections_return_none() {
        let one = page("A", r#"<h2 class="mt20">ワザ</h2><h4>M</h4>"#);
        let html = one.replace("</body>", r#"<section class="Section"></section></body>"#);
        assert_eq!(extractor().extract(CardId(6), &html), None);
    }

    #[test]
    fn test_missing_info_box_returns_none() {
        let html = r#"<section class="Section"><h1 class="Heading1 mt20">X</h1></section>"#;
        assert_eq!(extractor().extract(CardId(7), html), None);
    }

    #[test]
    fn test_decoration_inside_label_is_ignored() {
        let html = page(
            "ミュウ",
            r#"
      <h2 class="mt20">特性<span class="f_right Text-fjalla">NEW</span></h2>
      <h4>リスタート</h4>
      <h4>ゲノムハック</h4>
"#,
        );

        let record = extractor().extract(CardId(8), &html).unwrap();
        assert_eq!(record.ability, "リスタート");
        assert_eq!(record.attack, "ゲノムハック");
    }

    #[test]
    fn test_custom_vocabulary() {
        let mut config = ExtractConfig::default();
        config.labels.ability = "Ability".into();
        config.labels.move_ = "Attack".into();
        let extractor = CardExtractor::new(&config).unwrap();

        let html = page(
            "Pikachu",
            r#"<h2 class="mt20">Attack</h2><h4>Gnaw</h4><h4>Thunder Jolt</h4>"#,
        );
        let record = extractor.extract(CardId(9), &html).unwrap();
        assert_eq!(record.attack, "Gnaw/Thunder Jolt");
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut config = ExtractConfig::default();
        config.selectors.section = "[[broken".into();
        assert!(CardExtractor::new(&config).is_err());
    }
}
