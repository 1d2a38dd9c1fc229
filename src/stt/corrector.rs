use tracing::debug;

/// Phonetic misrecognition repairs for church-domain Korean speech.
/// Applied in order; earlier entries may shadow longer variants below them.
const PHONETIC_CORRECTIONS: &[(&str, &str)] = &[
    ("성심", "성신"),
    ("성인", "성신"),
    ("성식", "성신"),
    ("감정", "간증"),
    ("간정", "간증"),
    ("간점", "간증"),
    ("구조", "구주"),
    ("국주", "구주"),
    ("형재", "형제"),
    ("현제", "형제"),
    ("자미", "자매"),
    ("자배", "자매"),
    ("워드", "와드"),
    ("왔드", "와드"),
    ("원드", "와드"),
    ("성찰", "성찬"),
    ("생산", "성찬"),
    ("성차", "성찬"),
    ("신관", "신권"),
    ("신원", "신권"),
    ("측복", "축복"),
    ("축보", "축복"),
    ("칠례", "침례"),
    ("협게", "회개"),
    ("회계", "회개"),
    ("속제", "속죄"),
    ("속재", "속죄"),
    ("미듬", "믿음"),
    ("미드믈", "믿음을"),
    ("바들", "받을"),
    ("바즐", "받을"),
    ("이슬", "있을"),
    ("이즐", "있을"),
    ("하난님", "하나님"),
    ("한나님", "하나님"),
    ("하눈님", "하나님"),
    ("하나님게서", "하나님께서"),
    ("하나님에서", "하나님께서"),
    ("말슴", "말씀"),
    ("말씸", "말씀"),
    ("사랑한니다", "사랑합니다"),
    ("그램", "그럼"),
];

/// Dropped-particle and spacing repairs.
const STRUCTURE_FIXES: &[(&str, &str)] = &[
    ("교회 갑니다", "교회에 갑니다"),
    ("교회 왔습니다", "교회에 왔습니다"),
    ("저 생각", "저는 생각"),
    ("우리 하나님", "우리의 하나님"),
    ("우리 구주", "우리의 구주"),
    ("예수 그리스도 이름으로", "예수 그리스도의 이름으로"),
    ("말씀 드리겠습니다", "말씀드리겠습니다"),
    ("간증 드립니다", "간증드립니다"),
    ("축복 받을", "축복을 받을"),
    ("성신 통해", "성신을 통해"),
    ("감사 드립니다", "감사드립니다"),
    ("예수그리스도", "예수 그리스도"),
];

const SUBJECT_MARKERS: &[&str] = &["저", "우리", "그", "이", "여러분", "형제", "자매"];
const BARE_VERB_ENDINGS: &[&str] = &["합니다", "입니다", "드립니다", "됩니다"];

/// Dictionary-driven repair of recognized text before it reaches translation.
#[derive(Debug, Default)]
pub struct TextCorrector;

impl TextCorrector {
    pub fn new() -> Self {
        Self
    }

    /// Repair phonetic misrecognitions and dropped particles, restoring a
    /// missing subject from context when a short verb-only sentence allows it.
    pub fn fix(&self, text: &str, context: &str) -> String {
        let mut text = text.trim().to_string();

        for (wrong, correct) in PHONETIC_CORRECTIONS {
            if text.contains(wrong) {
                text = text.replace(wrong, correct);
                debug!("phonetic repair: {} -> {}", wrong, correct);
            }
        }

        for (wrong, correct) in STRUCTURE_FIXES {
            if text.contains(wrong) {
                text = text.replace(wrong, correct);
                debug!("structure repair: {} -> {}", wrong, correct);
            }
        }

        if text == "그래서가" || text == "그래서 가" {
            text = "그래서 우리가".to_string();
        }

        // Short verb-only sentences often lose their subject in fast speech.
        if !SUBJECT_MARKERS.iter().any(|m| text.contains(m))
            && text.chars().count() < 15
            && BARE_VERB_ENDINGS.iter().any(|v| text.contains(v))
        {
            if context.contains("저는") || context.contains("저가") {
                text = format!("저는 {}", text);
                debug!("restored subject: '{}'", text);
            } else if context.contains("우리") {
                text = format!("우리는 {}", text);
                debug!("restored subject: '{}'", text);
            }
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phonetic_repair() {
        let corrector = TextCorrector::new();
        assert_eq!(corrector.fix("감정을 드립니다", ""), "간증을 드립니다");
        assert_eq!(
            corrector.fix("성심이 우리를 인도하십니다", ""),
            "성신이 우리를 인도하십니다"
        );
    }

    #[test]
    fn test_structure_repair() {
        let corrector = TextCorrector::new();
        assert_eq!(corrector.fix("교회 갑니다", ""), "교회에 갑니다");
        assert_eq!(
            corrector.fix("예수 그리스도 이름으로", ""),
            "예수 그리스도의 이름으로"
        );
    }

    #[test]
    fn test_subject_restored_from_context() {
        let corrector = TextCorrector::new();
        assert_eq!(
            corrector.fix("간증드립니다", "저는 오늘 말씀을 전합니다"),
            "저는 간증드립니다"
        );
    }

    #[test]
    fn test_subject_kept_when_present() {
        let corrector = TextCorrector::new();
        assert_eq!(
            corrector.fix("우리는 감사합니다", "저는 말씀드립니다"),
            "우리는 감사합니다"
        );
    }

    #[test]
    fn test_clean_text_unchanged() {
        let corrector = TextCorrector::new();
        let text = "오늘 날씨가 좋습니다";
        assert_eq!(corrector.fix(text, ""), text);
    }
}
