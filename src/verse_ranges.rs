//! Lookup tables from verse numbers to the texts that contain them.
//!
//! The Dhammapada, Theragāthā, Therīgāthā and Suttanipāta are often cited by
//! verse number (`Dhp 182`, `Thag 1207`), while texts are identified by
//! chapter or sutta number (`dhp179-196`, `thag20.1`).

/// Verse ranges of the 26 chapters of the Dhammapada.
static DHP_CHAPTERS: &[(u32, u32)] = &[
    (1, 20), (21, 32), (33, 43), (44, 59),
    (60, 75), (76, 89), (90, 99), (100, 115),
    (116, 128), (129, 145), (146, 156), (157, 166),
    (167, 178), (179, 196), (197, 208), (209, 220),
    (221, 234), (235, 255), (256, 272), (273, 289),
    (290, 305), (306, 319), (320, 333), (334, 359),
    (360, 382), (383, 423),
];

/// Verses of the Theragāthā from the Dukanipāta on. Verses 1-120 map
/// one-to-one onto `thag1.N`.
static THAG_UID_TO_RANGE: &[(&str, u32, u32)] = &[
    ("thag2.1", 121, 122),
    ("thag2.2", 123, 124),
    ("thag2.3", 125, 126),
    ("thag2.4", 127, 128),
    ("thag2.5", 129, 130),
    ("thag2.6", 131, 132),
    ("thag2.7", 133, 134),
    ("thag2.8", 135, 136),
    ("thag2.9", 137, 138),
    ("thag2.10", 139, 140),
    ("thag2.11", 141, 142),
    ("thag2.12", 143, 144),
    ("thag2.13", 145, 146),
    ("thag2.14", 147, 148),
    ("thag2.15", 149, 150),
    ("thag2.16", 151, 152),
    ("thag2.17", 153, 154),
    ("thag2.18", 155, 156),
    ("thag2.19", 157, 158),
    ("thag2.20", 159, 160),
    ("thag2.21", 161, 162),
    ("thag2.22", 163, 164),
    ("thag2.23", 165, 166),
    ("thag2.24", 167, 168),
    ("thag2.25", 169, 170),
    ("thag2.26", 171, 172),
    ("thag2.27", 173, 174),
    ("thag2.28", 175, 176),
    ("thag2.29", 177, 178),
    ("thag2.30", 179, 180),
    ("thag2.31", 181, 182),
    ("thag2.32", 183, 184),
    ("thag2.33", 185, 186),
    ("thag2.34", 187, 188),
    ("thag2.35", 189, 190),
    ("thag2.36", 191, 192),
    ("thag2.37", 193, 194),
    ("thag2.38", 195, 196),
    ("thag2.39", 197, 198),
    ("thag2.40", 199, 200),
    ("thag2.41", 201, 202),
    ("thag2.42", 203, 204),
    ("thag2.43", 205, 206),
    ("thag2.44", 207, 208),
    ("thag2.45", 209, 210),
    ("thag2.46", 211, 212),
    ("thag2.47", 213, 214),
    ("thag2.48", 215, 216),
    ("thag2.49", 217, 218),
    ("thag3.1", 219, 221),
    ("thag3.2", 222, 224),
    ("thag3.3", 225, 227),
    ("thag3.4", 228, 230),
    ("thag3.5", 231, 233),
    ("thag3.6", 234, 236),
    ("thag3.7", 237, 239),
    ("thag3.8", 240, 242),
    ("thag3.9", 243, 245),
    ("thag3.10", 246, 248),
    ("thag3.11", 249, 251),
    ("thag3.12", 252, 254),
    ("thag3.13", 255, 257),
    ("thag3.14", 258, 260),
    ("thag3.15", 261, 263),
    ("thag3.16", 264, 266),
    ("thag4.1", 267, 270),
    ("thag4.2", 271, 274),
    ("thag4.3", 275, 278),
    ("thag4.4", 279, 282),
    ("thag4.5", 283, 286),
    ("thag4.6", 287, 290),
    ("thag4.7", 291, 294),
    ("thag4.8", 295, 298),
    ("thag4.9", 299, 302),
    ("thag4.10", 303, 306),
    ("thag4.11", 307, 310),
    ("thag4.12", 311, 314),
    ("thag5.1", 315, 319),
    ("thag5.2", 320, 324),
    ("thag5.3", 325, 329),
    ("thag5.4", 330, 334),
    ("thag5.5", 335, 339),
    ("thag5.6", 340, 344),
    ("thag5.7", 345, 349),
    ("thag5.8", 350, 354),
    ("thag5.9", 355, 359),
    ("thag5.10", 360, 364),
    ("thag5.11", 365, 369),
    ("thag5.12", 370, 374),
    ("thag6.1", 375, 380),
    ("thag6.2", 381, 386),
    ("thag6.3", 387, 392),
    ("thag6.4", 393, 398),
    ("thag6.5", 399, 404),
    ("thag6.6", 405, 410),
    ("thag6.7", 411, 416),
    ("thag6.8", 417, 422),
    ("thag6.9", 423, 428),
    ("thag6.10", 429, 434),
    ("thag6.11", 435, 440),
    ("thag6.12", 441, 446),
    ("thag6.13", 447, 452),
    ("thag6.14", 453, 458),
    ("thag7.1", 459, 465),
    ("thag7.2", 466, 472),
    ("thag7.3", 473, 479),
    ("thag7.4", 480, 486),
    ("thag7.5", 487, 493),
    ("thag8.1", 494, 501),
    ("thag8.2", 502, 509),
    ("thag8.3", 510, 517),
    ("thag9.1", 518, 526),
    ("thag10.1", 527, 536),
    ("thag10.2", 537, 546),
    ("thag10.3", 547, 556),
    ("thag10.4", 557, 566),
    ("thag10.5", 567, 576),
    ("thag10.6", 577, 586),
    ("thag10.7", 587, 596),
    ("thag11.1", 597, 607),
    ("thag12.1", 608, 619),
    ("thag12.2", 620, 631),
    ("thag13.1", 632, 644),
    ("thag14.1", 645, 658),
    ("thag14.2", 659, 672),
    ("thag15.1", 673, 688),
    ("thag15.2", 689, 704),
    ("thag16.1", 705, 725),
    ("thag16.2", 726, 746),
    ("thag16.3", 747, 768),
    ("thag16.4", 769, 793),
    ("thag16.5", 794, 817),
    ("thag16.6", 818, 841),
    ("thag16.7", 842, 865),
    ("thag16.8", 866, 891),
    ("thag16.9", 892, 919),
    ("thag16.10", 920, 948),
    ("thag17.1", 949, 980),
    ("thag17.2", 981, 1017),
    ("thag17.3", 1018, 1050),
    ("thag18.1", 1051, 1090),
    ("thag19.1", 1091, 1145),
    ("thag20.1", 1146, 1208),
    ("thag21.1", 1209, 1279),
];

/// Verses of the Therīgāthā from the Dukanipāta on. Verses 1-18 map one-to-one
/// onto `thig1.N`.
static THIG_UID_TO_RANGE: &[(&str, u32, u32)] = &[
    ("thig2.1", 19, 20),
    ("thig2.2", 21, 22),
    ("thig2.3", 23, 24),
    ("thig2.4", 25, 26),
    ("thig2.5", 27, 28),
    ("thig2.6", 29, 30),
    ("thig2.7", 31, 32),
    ("thig2.8", 33, 34),
    ("thig2.9", 35, 36),
    ("thig2.10", 37, 38),
    ("thig3.1", 39, 41),
    ("thig3.2", 42, 44),
    ("thig3.3", 45, 47),
    ("thig3.4", 48, 50),
    ("thig3.5", 51, 53),
    ("thig3.6", 54, 56),
    ("thig3.7", 57, 59),
    ("thig3.8", 60, 62),
    ("thig4.1", 63, 66),
    ("thig5.1", 67, 71),
    ("thig5.2", 72, 76),
    ("thig5.3", 77, 81),
    ("thig5.4", 82, 86),
    ("thig5.5", 87, 91),
    ("thig5.6", 92, 96),
    ("thig5.7", 97, 101),
    ("thig5.8", 102, 106),
    ("thig5.9", 107, 111),
    ("thig5.10", 112, 116),
    ("thig5.11", 117, 121),
    ("thig5.12", 122, 126),
    ("thig6.1", 127, 132),
    ("thig6.2", 133, 138),
    ("thig6.3", 139, 144),
    ("thig6.4", 145, 150),
    ("thig6.5", 151, 156),
    ("thig6.6", 157, 162),
    ("thig6.7", 163, 168),
    ("thig6.8", 169, 174),
    ("thig7.1", 175, 181),
    ("thig7.2", 182, 188),
    ("thig7.3", 189, 195),
    ("thig8.1", 196, 203),
    ("thig9.1", 204, 212),
    ("thig10.1", 213, 223),
    ("thig11.1", 224, 235),
    ("thig12.1", 236, 251),
    ("thig13.1", 252, 270),
    ("thig13.2", 271, 290),
    ("thig13.3", 291, 311),
    ("thig13.4", 312, 337),
    ("thig13.5", 338, 365),
    ("thig14.1", 366, 399),
    ("thig15.1", 400, 447),
    ("thig16.1", 448, 522),
];

static SNP_UID_TO_RANGE: &[(&str, u32, u32)] = &[
    ("snp1.1", 1, 17),
    ("snp1.2", 18, 34),
    ("snp1.3", 35, 75),
    ("snp1.4", 76, 82),
    ("snp1.5", 83, 90),
    ("snp1.6", 91, 115),
    ("snp1.7", 116, 142),
    ("snp1.8", 143, 152),
    ("snp1.9", 153, 180),
    ("snp1.10", 181, 192),
    ("snp1.11", 193, 206),
    ("snp1.12", 207, 221),
    ("snp2.1", 222, 238),
    ("snp2.2", 239, 252),
    ("snp2.3", 253, 257),
    ("snp2.4", 258, 269),
    ("snp2.5", 270, 273),
    ("snp2.6", 274, 283),
    ("snp2.7", 284, 315),
    ("snp2.8", 316, 323),
    ("snp2.9", 324, 330),
    ("snp2.10", 331, 334),
    ("snp2.11", 335, 342),
    ("snp2.12", 343, 358),
    ("snp2.13", 359, 375),
    ("snp2.14", 376, 404),
    ("snp3.1", 405, 424),
    ("snp3.2", 425, 449),
    ("snp3.3", 450, 454),
    ("snp3.4", 455, 486),
    ("snp3.5", 487, 509),
    ("snp3.6", 510, 547),
    ("snp3.7", 548, 573),
    ("snp3.8", 574, 593),
    ("snp3.9", 594, 656),
    ("snp3.10", 657, 678),
    ("snp3.11", 679, 723),
    ("snp3.12", 724, 765),
    ("snp4.1", 766, 771),
    ("snp4.2", 772, 779),
    ("snp4.3", 780, 787),
    ("snp4.4", 788, 795),
    ("snp4.5", 796, 803),
    ("snp4.6", 804, 813),
    ("snp4.7", 814, 823),
    ("snp4.8", 824, 834),
    ("snp4.9", 835, 847),
    ("snp4.10", 848, 861),
    ("snp4.11", 862, 877),
    ("snp4.12", 878, 894),
    ("snp4.13", 895, 914),
    ("snp4.14", 915, 934),
    ("snp4.15", 935, 954),
    ("snp4.16", 955, 975),
    ("snp5.1", 976, 1031),
    ("snp5.2", 1032, 1039),
    ("snp5.3", 1040, 1042),
    ("snp5.4", 1043, 1048),
    ("snp5.5", 1049, 1060),
    ("snp5.6", 1061, 1068),
    ("snp5.7", 1069, 1076),
    ("snp5.8", 1077, 1083),
    ("snp5.9", 1084, 1087),
    ("snp5.10", 1088, 1091),
    ("snp5.11", 1092, 1095),
    ("snp5.12", 1096, 1100),
    ("snp5.13", 1101, 1104),
    ("snp5.14", 1105, 1111),
    ("snp5.15", 1112, 1115),
    ("snp5.16", 1116, 1119),
    ("snp5.17", 1120, 1123),
    ("snp5.18", 1124, 1149),
];

fn lookup(table: &[(&str, u32, u32)], verse_num: u32) -> Option<String> {
    table
        .iter()
        .find(|(_, first, last)| (*first..=*last).contains(&verse_num))
        .map(|(uid, _, _)| (*uid).to_string())
}

/// The chapter uid of a Dhammapada verse, e.g. 182 → `dhp179-196`.
pub fn dhp_verse_to_chapter(verse_num: u32) -> Option<String> {
    DHP_CHAPTERS
        .iter()
        .find(|(first, last)| (*first..=*last).contains(&verse_num))
        .map(|(first, last)| format!("dhp{first}-{last}"))
}

/// The chapter uid of a Dhammapada chapter number, e.g. 14 → `dhp179-196`.
pub fn dhp_chapter_ref_for_verse_num(chapter: u32) -> Option<String> {
    let idx = usize::try_from(chapter).ok()?.checked_sub(1)?;
    DHP_CHAPTERS
        .get(idx)
        .map(|(first, last)| format!("dhp{first}-{last}"))
}

pub fn thag_verse_to_uid(verse_num: u32) -> Option<String> {
    match verse_num {
        0 => None,
        1..=120 => Some(format!("thag1.{verse_num}")),
        _ => lookup(THAG_UID_TO_RANGE, verse_num),
    }
}

pub fn thig_verse_to_uid(verse_num: u32) -> Option<String> {
    match verse_num {
        0 => None,
        1..=18 => Some(format!("thig1.{verse_num}")),
        _ => lookup(THIG_UID_TO_RANGE, verse_num),
    }
}

pub fn snp_verse_to_uid(verse_num: u32) -> Option<String> {
    lookup(SNP_UID_TO_RANGE, verse_num)
}

/// Map a verse-numbered citation such as `dhp182` or `thag1207` to the uid
/// of the text containing the verse. Returns `None` when `uid` isn't a
/// bare verse citation.
pub fn verse_citation_to_uid(uid: &str) -> Option<String> {
    let (book, num) = ["dhp", "snp", "thag", "thig"]
        .iter()
        .find_map(|book| uid.strip_prefix(book).map(|rest| (*book, rest)))?;

    if num.is_empty() || !num.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u32 = num.parse().ok()?;

    match book {
        "dhp" => dhp_verse_to_chapter(n),
        "snp" => snp_verse_to_uid(n),
        "thag" => thag_verse_to_uid(n),
        "thig" => thig_verse_to_uid(n),
        _ => None,
    }
}
