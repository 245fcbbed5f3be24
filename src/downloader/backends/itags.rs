// Nominal attributes of well-known YouTube itags
//
// yt-dlp reports measured heights and bitrates (e.g. abr 129.5). Selection
// compares against the nominal labels ("360p", "128kbps"), so known itags
// are looked up here first.

/// (resolution, audio bitrate) for progressive itags
const PROGRESSIVE: &[(u32, &str, Option<&str>)] = &[
    (5, "240p", Some("64kbps")),
    (6, "270p", Some("64kbps")),
    (13, "144p", None),
    (17, "144p", Some("24kbps")),
    (18, "360p", Some("96kbps")),
    (22, "720p", Some("192kbps")),
    (34, "360p", Some("128kbps")),
    (35, "480p", Some("128kbps")),
    (36, "240p", None),
    (37, "1080p", Some("192kbps")),
    (38, "3072p", Some("192kbps")),
    (43, "360p", Some("128kbps")),
    (44, "480p", Some("128kbps")),
    (45, "720p", Some("192kbps")),
    (46, "1080p", Some("192kbps")),
    (59, "480p", Some("128kbps")),
    (78, "480p", Some("128kbps")),
    (82, "360p", Some("128kbps")),
    (83, "480p", Some("128kbps")),
    (84, "720p", Some("192kbps")),
    (85, "1080p", Some("192kbps")),
];

/// Resolution for adaptive video-only itags
const DASH_VIDEO: &[(u32, &str)] = &[
    (133, "240p"),
    (134, "360p"),
    (135, "480p"),
    (136, "720p"),
    (137, "1080p"),
    (138, "2160p"),
    (160, "144p"),
    (242, "240p"),
    (243, "360p"),
    (244, "480p"),
    (247, "720p"),
    (248, "1080p"),
    (264, "1440p"),
    (266, "2160p"),
    (271, "1440p"),
    (278, "144p"),
    (298, "720p"),
    (299, "1080p"),
    (302, "720p"),
    (303, "1080p"),
    (308, "1440p"),
    (313, "2160p"),
    (315, "2160p"),
    (394, "144p"),
    (395, "240p"),
    (396, "360p"),
    (397, "480p"),
    (398, "720p"),
    (399, "1080p"),
    (400, "1440p"),
    (401, "2160p"),
];

/// Bitrate for adaptive audio-only itags
const DASH_AUDIO: &[(u32, &str)] = &[
    (139, "48kbps"),
    (140, "128kbps"),
    (141, "256kbps"),
    (171, "128kbps"),
    (172, "256kbps"),
    (249, "50kbps"),
    (250, "70kbps"),
    (251, "160kbps"),
    (256, "192kbps"),
    (258, "384kbps"),
];

/// Plain numeric itag of a yt-dlp format id; "140-drc" and "hls-96" are not itags
pub fn parse_itag(format_id: &str) -> Option<u32> {
    format_id.parse().ok()
}

pub fn nominal_resolution(itag: u32) -> Option<&'static str> {
    PROGRESSIVE
        .iter()
        .find(|(i, _, _)| *i == itag)
        .map(|(_, res, _)| *res)
        .or_else(|| DASH_VIDEO.iter().find(|(i, _)| *i == itag).map(|(_, res)| *res))
}

pub fn nominal_audio_bitrate(itag: u32) -> Option<&'static str> {
    PROGRESSIVE
        .iter()
        .find(|(i, _, _)| *i == itag)
        .and_then(|(_, _, abr)| *abr)
        .or_else(|| DASH_AUDIO.iter().find(|(i, _)| *i == itag).map(|(_, abr)| *abr))
}
