use super::*;
use crate::config::PosterConfig;
use crate::poster::pipeline::{PosterPipeline, PosterRequest};

fn poster() -> PosterImage {
    let pipeline = PosterPipeline::new(PosterConfig {
        supersample: 0.1,
        system_fonts: false,
        ..PosterConfig::default()
    });
    pipeline
        .generate_poster(&PosterRequest::new("日常", "A", "desc"), None, None)
        .unwrap()
}

#[test]
fn dir_sink_writes_named_png() {
    let dir = std::env::temp_dir().join(format!("dressing_room_sink_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let mut sink = DirPosterSink::new(&dir);
    sink.deliver(&poster()).unwrap();

    let path = dir.join("日常_A_海报.png");
    assert_eq!(sink.written(), &[path.clone()]);
    let img = image::open(&path).unwrap();
    assert_eq!((img.width(), img.height()), (80, 110));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn memory_sink_keeps_delivery_order() {
    let mut sink = InMemoryPosterSink::new();
    let p = poster();
    sink.deliver(&p).unwrap();
    sink.deliver(&p).unwrap();
    assert_eq!(sink.posters.len(), 2);
    assert_eq!(sink.posters[0].filename(), "日常_A_海报.png");
}
