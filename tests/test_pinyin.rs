mod common;

#[cfg(test)]
mod tests {
    use super::common;

    #[test]
    fn single_character_test() {
        let pinyin = common::pinyin();
        for &(ch, syllable) in common::CHARACTERS {
            let input = ch.to_string();
            let expected_initial = &syllable[..1];
            assert_eq!(pinyin.get_pinyin(&input, " "), syllable, "pinyin of {}", ch);
            assert_eq!(pinyin.get_initial(&input, None), expected_initial, "initial of {}", ch);
        }
    }

    #[test]
    fn polyphone_word_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_pinyin("朝阳", " "), "chao yang");
        assert_eq!(pinyin.get_pinyin("朝", " "), "zhao");
        assert_eq!(pinyin.get_pinyin("银行", " "), "yin hang");
        assert_eq!(pinyin.get_pinyin("行", " "), "xing");
        assert_eq!(pinyin.get_pinyin("音乐", " "), "yin yue");
        assert_eq!(pinyin.get_pinyin("乐", " "), "le");
    }

    #[test]
    fn longest_match_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_pinyin("长大成人", " "), "zhang da cheng ren");
        assert_eq!(pinyin.get_pinyin("长大了", " "), "zhang da 了");
        assert_eq!(pinyin.get_pinyin("长城", " "), "chang cheng");
        let input = "中华人民共和国";
        let expected_output = "zhong hua ren min gong he guo";
        assert_eq!(pinyin.get_pinyin(input, " "), expected_output);
    }

    #[test]
    fn auxiliary_word_segmentation_test() {
        let pinyin = common::pinyin();
        // 学生 is consumed as a word, so 生长 is never tried.
        assert_eq!(pinyin.get_pinyin("学生长城", " "), "xue sheng chang cheng");
        assert_eq!(pinyin.get_pinyin("生长", " "), "sheng zhang");
    }

    #[test]
    fn traditional_rendering_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_pinyin("朝陽", " "), "chao yang");
        assert_eq!(pinyin.get_pinyin("銀行", " "), "yin hang");
        assert_eq!(pinyin.get_pinyin("長大成人", " "), "zhang da cheng ren");
        assert_eq!(
            pinyin.get_pinyin("中華人民共和國", " "),
            "zhong hua ren min gong he guo"
        );
    }

    #[test]
    fn repeated_calls_test() {
        let pinyin = common::pinyin();
        let input = "朝阳银行长大成人";
        let first = pinyin.get_pinyin(input, " ");
        for _ in 0..10 {
            assert_eq!(pinyin.get_pinyin(input, " "), first);
        }
        assert_eq!(first, "chao yang yin hang zhang da cheng ren");
    }

    #[test]
    fn mixed_script_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_pinyin("hello中国world", " "), "hello zhong guo world");
        assert_eq!(pinyin.get_pinyin("中国2024", "-"), "zhong-guo-2024");
        assert_eq!(pinyin.get_pinyin("Rust, 中国!", " "), "Rust, zhong guo !");
        assert_eq!(pinyin.get_pinyin("中国 人民", "-"), "zhong-guo ren-min");
        assert_eq!(pinyin.get_initial("中 国", Some(" ")), "z g");
        assert_eq!(pinyin.get_array("中 国"), vec!["zhong", " ", "guo"]);
        assert_eq!(pinyin.get_pinyin("abc", " "), "abc");
    }

    #[test]
    fn non_han_surrogate_pair_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_pinyin("中😀国", " "), "zhong 😀 guo");
        // Pair at the end of the input.
        assert_eq!(pinyin.get_pinyin("中😀", " "), "zhong 😀");
        assert_eq!(pinyin.get_pinyin("😀😀", " "), "😀😀");
        assert_eq!(pinyin.get_array("😀中"), vec!["😀", "zhong"]);
        assert_eq!(pinyin.get_initial("😀中国", None), "😀zg");
    }

    #[test]
    fn word_led_by_minor_block_test() {
        let pinyin = common::pinyin();
        let input = "\u{2A700}中";
        let expected_output = "kao zhong";
        assert_eq!(pinyin.get_pinyin(input, " "), expected_output);
        assert_eq!(pinyin.get_array(input), vec!["kao", "zhong"]);
        assert_eq!(pinyin.get_pinyin("\u{2A700}", " "), "ju");
        assert_eq!(pinyin.get_pinyin("\u{2A700}国", " "), "ju guo");
    }

    #[test]
    fn every_traditional_form_is_mirrored_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_pinyin("头发", " "), "tóu fa");
        assert_eq!(pinyin.get_pinyin("頭發", " "), "tóu fa");
        assert_eq!(pinyin.get_pinyin("頭髮", " "), "tóu fa");
        assert_eq!(pinyin.get_pinyin("髮", " "), "fà");
    }

    #[test]
    fn missing_reading_test() {
        let pinyin = common::pinyin();
        let input = format!("中{}国", common::NO_READING);
        let expected_output = format!("zhong {} guo", common::NO_READING);
        assert_eq!(pinyin.get_pinyin(&input, " "), expected_output);
    }

    #[test]
    fn supplementary_plane_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_pinyin("\u{20000}", " "), "qiu");
        assert_eq!(pinyin.get_pinyin("\u{20000}中", " "), "qiu zhong");
        assert_eq!(pinyin.get_array("\u{20000}中"), vec!["qiu", "zhong"]);
        // Word whose tail is a surrogate pair.
        assert_eq!(pinyin.get_pinyin("行\u{20000}", " "), "hang qiu");
        assert_eq!(pinyin.get_array("行\u{20000}"), vec!["hang", "qiu"]);
        assert_eq!(pinyin.get_pinyin("行", " "), "xing");
    }

    #[test]
    fn remapped_and_minor_blocks_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_pinyin("〇〇", " "), "ling ling");
        assert_eq!(pinyin.get_pinyin("\u{F900}", " "), "qi");
        assert_eq!(pinyin.get_pinyin("\u{2F00}", " "), "yi");
    }

    #[test]
    fn initial_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_initial("中国", None), "zg");
        assert_eq!(pinyin.get_initial("中国", Some(" ")), "z g");
        assert_eq!(pinyin.get_initial("朝阳", None), "cy");
        assert_eq!(pinyin.get_initial("a中b", Some("-")), "a-z-b");
    }

    #[test]
    fn array_test() {
        let pinyin = common::pinyin();
        let input = "a中国!";
        let expected_output = vec!["a", "zhong", "guo", "!"];
        assert_eq!(pinyin.get_array(input), expected_output);
        assert_eq!(pinyin.get_array("长大成人").len(), 4);
        assert!(pinyin.get_array("").is_empty());
    }

    #[test]
    fn empty_input_test() {
        let pinyin = common::pinyin();
        assert_eq!(pinyin.get_pinyin("", " "), "");
        assert_eq!(pinyin.get_initial("", None), "");
        assert_eq!(pinyin.get_pinyin_utf16(&[], " "), "");
    }

    #[test]
    fn utf16_input_test() {
        let pinyin = common::pinyin();
        let units: Vec<u16> = "朝阳".encode_utf16().collect();
        assert_eq!(pinyin.get_pinyin_utf16(&units, " "), "chao yang");
        // An unpaired high surrogate is copied as a replacement character.
        let units = [0xD840, '中' as u16];
        assert_eq!(pinyin.get_pinyin_utf16(&units, " "), "\u{FFFD} zhong");
    }
}
