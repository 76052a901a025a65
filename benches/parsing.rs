//! Benchmarks for the EPUB parsing pipeline.
//!
//! Run with: cargo bench

use std::io::{Cursor, Write};

use criterion::{Criterion, criterion_group, criterion_main};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use quire::resolve::resolve_chapter;
use quire::{MemoryArchive, SearchOptions, read_book_from_bytes, search};

const CHAPTERS: usize = 40;

/// Build a synthetic EPUB with `CHAPTERS` image-bearing chapters.
fn sample_epub() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    zip.start_file("META-INF/container.xml", deflated).unwrap();
    zip.write_all(
        br#"<?xml version="1.0"?><container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container"><rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles></container>"#,
    )
    .unwrap();

    let mut manifest = String::new();
    let mut spine = String::new();
    let mut nav_points = String::new();
    for i in 0..CHAPTERS {
        manifest.push_str(&format!(
            r#"<item id="c{i}" href="Text/c{i}.xhtml" media-type="application/xhtml+xml"/>"#
        ));
        spine.push_str(&format!(r#"<itemref idref="c{i}"/>"#));
        nav_points.push_str(&format!(
            r#"<navPoint id="n{i}"><navLabel><text>Chapter {i}</text></navLabel><content src="Text/c{i}.xhtml"/></navPoint>"#
        ));

        let paragraphs = "<p>It was the best of times, it was the worst of times.</p>".repeat(60);
        zip.start_file(format!("OEBPS/Text/c{i}.xhtml"), deflated).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0"?><html xmlns="http://www.w3.org/1999/xhtml"><head><title>c{i}</title></head><body><h1>Part {i}</h1>{paragraphs}<img src="../Images/fig{n}.png"/></body></html>"#,
            n = i % 4
        )
        .unwrap();
    }
    manifest.push_str(r#"<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>"#);

    for n in 0..4 {
        zip.start_file(format!("OEBPS/Images/fig{n}.png"), stored).unwrap();
        zip.write_all(&[0x89, 0x50, 0x4E, 0x47].repeat(2048)).unwrap();
    }

    zip.start_file("OEBPS/toc.ncx", deflated).unwrap();
    write!(zip, r#"<ncx><navMap>{nav_points}</navMap></ncx>"#).unwrap();
    zip.start_file("OEBPS/content.opf", deflated).unwrap();
    write!(
        zip,
        r#"<package version="3.0"><metadata><dc:title>Benchmark</dc:title></metadata><manifest>{manifest}</manifest><spine toc="ncx">{spine}</spine></package>"#
    )
    .unwrap();

    zip.finish().unwrap().into_inner()
}

fn bench_read_book(c: &mut Criterion) {
    let epub = sample_epub();
    c.bench_function("read_book_from_bytes", |b| {
        b.iter(|| read_book_from_bytes(&epub).unwrap());
    });
}

fn bench_resolve_chapter(c: &mut Criterion) {
    let archive = MemoryArchive::new().with_entry("OEBPS/Images/fig.png", vec![0x89; 8192]);
    let body = format!(
        r#"{}<img src="../Images/fig.png"/><img src="missing.png"/><script>x()</script>"#,
        "<p>Lorem ipsum dolor sit amet.</p>".repeat(100)
    );
    c.bench_function("resolve_chapter", |b| {
        b.iter(|| resolve_chapter(&body, "OEBPS/Text/c.xhtml", &archive, "OEBPS"));
    });
}

fn bench_search(c: &mut Criterion) {
    let book = read_book_from_bytes(&sample_epub()).unwrap();
    let options = SearchOptions::default();
    c.bench_function("search", |b| {
        b.iter(|| search(&book, "worst of times", &options));
    });
}

criterion_group!(benches, bench_read_book, bench_resolve_chapter, bench_search);
criterion_main!(benches);
