use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "amber", "ancient", "bold", "brave", "bright", "calm", "clever", "crimson", "curious",
    "daring", "eager", "fancy", "gentle", "golden", "hidden", "humble", "jolly", "keen",
    "lively", "lucky", "mellow", "misty", "nimble", "quiet", "rapid", "silent", "silver",
    "steady", "swift", "tidy", "vivid", "wise",
];

const NOUNS: &[&str] = &[
    "badger", "beacon", "brook", "canyon", "cedar", "comet", "crane", "falcon", "fern",
    "fjord", "glacier", "harbor", "heron", "island", "lark", "lynx", "maple", "meadow",
    "otter", "pebble", "quartz", "raven", "reef", "ridge", "river", "sparrow", "summit",
    "thistle", "tundra", "valley", "willow", "wren",
];

/// Generate a human-readable identity token such as `"swift-amber-heron"`.
///
/// Two adjectives and a noun give 32k combinations, enough to tell apart the
/// artifacts of one line at a glance. Slugs are not guaranteed unique.
pub fn generate_slug<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = pick(&mut *rng, ADJECTIVES);
    let second = pick(&mut *rng, ADJECTIVES);
    let noun = pick(&mut *rng, NOUNS);
    format!("{first}-{second}-{noun}")
}

fn pick<R: Rng + ?Sized>(rng: &mut R, words: &[&'static str]) -> &'static str {
    words.choose(rng).copied().unwrap_or("unnamed")
}
