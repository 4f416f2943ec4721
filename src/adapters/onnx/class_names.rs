pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

pub fn coco_names() -> Vec<String> {
    COCO_CLASSES.iter().map(|s| s.to_string()).collect()
}

/// Parses the `names` entry ultralytics writes into exported models,
/// e.g. `{0: 'person', 1: 'bicycle'}`. Ids missing from the map get `class_<id>`.
pub fn parse_names_metadata(raw: &str) -> Option<Vec<String>> {
    let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
    let mut entries: Vec<(usize, String)> = Vec::new();
    let mut rest = body.trim_start();

    while !rest.is_empty() {
        let (key, after_key) = rest.split_once(':')?;
        let id: usize = key.trim().parse().ok()?;
        let after_key = after_key.trim_start();
        let quote = after_key.chars().next().filter(|c| *c == '\'' || *c == '"')?;
        let value_and_rest = &after_key[1..];
        let end = value_and_rest.find(quote)?;
        entries.push((id, value_and_rest[..end].to_string()));

        rest = value_and_rest[end + 1..].trim_start();
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }

    let len = entries.iter().map(|(id, _)| id + 1).max()?;
    let mut names: Vec<String> = (0..len).map(|i| format!("class_{i}")).collect();
    for (id, name) in entries {
        names[id] = name;
    }
    Some(names)
}
