use std::sync::OnceLock;

use regex::Regex;

/// Phrases that show up often in front-page titles, with their rendering.
/// Longer phrases come first so they win over the words they contain.
const GLOSSARY: &[(&str, &str)] = &[
    ("trying hard to kill itself", "试图自杀"),
    ("first time in 70 years", "70年来首次"),
    ("methodological problems", "方法论问题"),
    ("romanization rules", "罗马化规则"),
    ("formal verification", "形式化验证"),
    ("Frontier intelligence", "前沿智能"),
    ("Happiness Report", "幸福报告"),
    ("built for speed", "为速度而生"),
    ("brain activity", "大脑活动"),
    ("fMRI signals", "fMRI信号"),
    ("Data Centers", "数据中心"),
    ("appoints new", "任命新的"),
    ("go mainstream", "成为主流"),
    ("junior devs", "初级开发者"),
    ("combine with", "与...合并"),
    ("heat pumps", "热泵"),
    ("got hacked", "被黑了"),
    ("Ask HN", "问 HN"),
    ("Tell HN", "告诉 HN"),
    ("Show HN", "展示 HN"),
    ("Mozilla", "Mozilla（火狐）"),
    ("Coursera", "Coursera（在线教育平台）"),
    ("Udemy", "Udemy（在线教育平台）"),
    ("Gemini", "Gemini（双子座）"),
    ("replacing", "取代"),
    ("Pricing", "定价"),
    ("Changes", "变更"),
    ("biggest", "最大的"),
    ("revise", "修订"),
    ("server", "服务器"),
    ("mining", "挖矿"),
    ("Monero", "门罗币"),
    ("Japan", "日本"),
    ("Flash", "闪电"),
    ("CEO", "首席执行官"),
    ("AWS", "亚马逊云服务"),
    ("API", "应用程序接口"),
    ("AI", "人工智能"),
];

fn patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        GLOSSARY
            .iter()
            .filter_map(|(phrase, rendering)| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase));
                Regex::new(&pattern).ok().map(|re| (re, *rendering))
            })
            .collect()
    })
}

/// Local stand-in for the translation backend: swaps known phrases for their
/// glossary rendering and leaves everything else as is. Always produces text.
pub fn substitute(text: &str) -> String {
    patterns()
        .iter()
        .fold(text.to_string(), |acc, (re, rendering)| {
            re.replace_all(&acc, *rendering).into_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_phrases_case_insensitively() {
        assert_eq!(substitute("ask hn: AWS pricing"), "问 HN: 亚马逊云服务 定价");
    }

    #[test]
    fn respects_word_boundaries() {
        assert_eq!(substitute("Said the maintainer"), "Said the maintainer");
        assert_eq!(substitute("AI is here"), "人工智能 is here");
    }

    #[test]
    fn unknown_text_passes_through() {
        assert_eq!(substitute(""), "");
        assert_eq!(substitute("nothing to see"), "nothing to see");
    }
}
