use lcars_types::{EpisodeId, LcarsError, SeasonId};
use proptest::prelude::*;

#[test]
fn parses_canonical_ids() {
    let id = EpisodeId::parse("ent_s1_e01").unwrap();
    assert_eq!(id.series(), "ent");
    assert_eq!(id.season(), 1);
    assert_eq!(id.episode(), 1);
    assert_eq!(id.to_string(), "ent_s1_e01");
}

#[test]
fn rejects_malformed_ids() {
    for bad in [
        "",
        "ent",
        "ent_s1",
        "ENT_s1_e01",
        "ent_s_e01",
        "ent_s1_e1",
        "ent_s1_e001",
        "ent_s1_e0x",
        "ent_1_e01",
        "ent_s1_e01_x",
        "en7_s1_e01",
    ] {
        let err = EpisodeId::parse(bad).unwrap_err();
        assert!(matches!(err, LcarsError::Validation(_)), "accepted {bad:?}");
    }
}

#[test]
fn orders_by_series_season_episode() {
    let a = EpisodeId::parse("ent_s1_e02").unwrap();
    let b = EpisodeId::parse("ent_s1_e10").unwrap();
    let c = EpisodeId::parse("ent_s2_e01").unwrap();
    let d = EpisodeId::parse("tng_s1_e01").unwrap();
    assert!(a < b);
    assert!(b < c);
    assert!(c < d);
}

#[test]
fn season_id_round_trips() {
    let id = EpisodeId::parse("voy_s4_e07").unwrap();
    assert_eq!(id.season_id().to_string(), "voy_s4");
    let season = SeasonId::parse("voy_s4").unwrap();
    assert_eq!(season.series(), "voy");
    assert_eq!(season.season(), 4);
    assert!(SeasonId::parse("voy_s4_e07").is_err());
}

#[test]
fn serde_uses_the_canonical_string_form() {
    let id = EpisodeId::parse("ds9_s3_e15").unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"ds9_s3_e15\"");
    let back: EpisodeId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
    assert!(serde_json::from_str::<EpisodeId>("\"ds9_3_15\"").is_err());
}

proptest! {
    #[test]
    fn parse_format_identity(
        series in "[a-z]{2,5}",
        season in 1u32..=99,
        episode in 1u32..=99,
    ) {
        let rendered = format!("{series}_s{season}_e{episode:02}");
        let parsed = EpisodeId::parse(&rendered).unwrap();
        prop_assert_eq!(parsed.to_string(), rendered);
        prop_assert_eq!(parsed.season(), season);
        prop_assert_eq!(parsed.episode(), episode);
    }
}
