mod common;

use common::{Harness, open, sample_book};
use folio::overlay::{Annotation, DrawStyle};
use folio::search::{CancelToken, SearchEvent, SearchOptions};

fn collect(h: &mut Harness, options: SearchOptions) -> Vec<SearchEvent> {
    h.view
        .search(options)
        .map(|event| event.unwrap())
        .collect()
}

fn progress_values(events: &[SearchEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            SearchEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

#[test]
fn test_whole_book_search_streams_in_section_order() {
    let mut h = open(sample_book());
    let events = collect(&mut h, SearchOptions::new("whale"));

    assert_eq!(events.len(), 7);
    assert_eq!(events[0], SearchEvent::Progress(0.25));
    assert_eq!(events[1], SearchEvent::Progress(0.5));
    match &events[2] {
        SearchEvent::Section { index, subitems } => {
            assert_eq!(*index, 1);
            assert_eq!(subitems.len(), 1);
            assert_eq!(subitems[0].address, "epubcfi(/6/4!/4/4/1,:4,:9)");
            assert_eq!(subitems[0].excerpt.matched, "whale");
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(events[3], SearchEvent::Progress(0.75));
    match &events[4] {
        SearchEvent::Section { index, subitems } => {
            assert_eq!(*index, 2);
            let addresses: Vec<&str> = subitems.iter().map(|s| s.address.as_str()).collect();
            assert_eq!(
                addresses,
                vec!["epubcfi(/6/6!/4/4/1,:8,:13)", "epubcfi(/6/6!/4/4/1,:28,:33)"]
            );
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(events[5], SearchEvent::Progress(1.0));
    assert_eq!(events[6], SearchEvent::Done);

    assert_eq!(h.view.overlays().search_results(1).len(), 1);
    assert_eq!(h.view.overlays().search_results(2).len(), 2);
}

#[test]
fn test_sections_without_documents_are_skipped() {
    let mut book = sample_book();
    book.sections[2] = book.sections[2].clone().without_documents();
    let mut h = open(book);
    let events = collect(&mut h, SearchOptions::new("whale"));

    assert_eq!(progress_values(&events), vec![0.25, 0.5, 1.0]);
    assert!(!events.iter().any(|e| matches!(e, SearchEvent::Section { index: 2, .. })));
    assert_eq!(events.last(), Some(&SearchEvent::Done));
}

#[test]
fn test_load_failure_is_reported_and_search_continues() {
    let mut book = sample_book();
    book.sections[1] = book.sections[1].clone().failing();
    let mut h = open(book);
    let events: Vec<_> = h.view.search(SearchOptions::new("whale")).collect();

    assert!(matches!(events[1], Err(folio::error::Error::NotFound(_))));
    assert!(matches!(events.last(), Some(Ok(SearchEvent::Done))));
    let sections: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Ok(SearchEvent::Section { index, .. }) => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(sections, vec![2]);
}

#[test]
fn test_single_section_search_yields_hits() {
    let mut h = open(sample_book());
    let events = collect(&mut h, SearchOptions::new("whale").in_section(2));

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], SearchEvent::Hit(hit) if hit.excerpt.post.starts_with(", then")));
    assert!(matches!(&events[1], SearchEvent::Hit(_)));
    assert_eq!(events[2], SearchEvent::Done);
    assert!(h.view.overlays().search_results(1).is_empty());
    assert_eq!(h.view.overlays().search_results(2).len(), 2);
}

#[test]
fn test_hits_are_drawn_as_they_stream() {
    let mut h = open(sample_book());
    let drawn = h.show_section(2);
    {
        let mut stream = h.view.search(SearchOptions::new("whale"));
        stream.next();
        stream.next();
        stream.next();
        stream.next();
        assert!(matches!(
            stream.next(),
            Some(Ok(SearchEvent::Section { index: 2, .. }))
        ));
    }
    let drawn = drawn.borrow();
    assert_eq!(drawn.len(), 2);
    assert!(drawn.iter().all(|(value, _, style)| {
        value.starts_with("foliate-search:") && *style == DrawStyle::Outline
    }));
}

#[test]
fn test_search_is_lazy() {
    let mut h = open(sample_book());
    {
        let mut stream = h.view.search(SearchOptions::new("whale"));
        assert_eq!(stream.next().unwrap().unwrap(), SearchEvent::Progress(0.25));
    }
    assert!(!h.view.overlays().has_search_results());
}

#[test]
fn test_cancel_token_stops_stream() {
    let mut h = open(sample_book());
    let cancel = CancelToken::new();
    let mut stream = h
        .view
        .search(SearchOptions::new("whale").with_cancel(cancel.clone()));
    assert!(stream.next().is_some());
    cancel.cancel();
    assert!(stream.next().is_none());
    assert!(stream.next().is_none());
}

#[test]
fn test_clear_search_keeps_persistent_annotations() {
    let mut h = open(sample_book());
    let drawn = h.show_section(2);
    let note = Annotation::Persistent("epubcfi(/6/6!/4/2/1,:0,:2)".to_string());
    h.view.add_annotation(&note);
    collect(&mut h, SearchOptions::new("whale"));
    assert_eq!(drawn.borrow().len(), 3);

    h.view.clear_search();
    assert_eq!(Harness::drawn_values(&drawn), vec![note.value()]);
    assert_eq!(h.view.overlays().drawn(2), &[note]);
    assert!(!h.view.overlays().has_search_results());
}

#[test]
fn test_new_search_replaces_previous_hits() {
    let mut h = open(sample_book());
    let drawn = h.show_section(2);
    collect(&mut h, SearchOptions::new("whale").in_section(2));
    assert_eq!(drawn.borrow().len(), 2);

    collect(&mut h, SearchOptions::new("white").in_section(2));
    assert_eq!(
        Harness::drawn_values(&drawn),
        vec!["foliate-search:epubcfi(/6/6!/4/4/1,:2,:7)".to_string()]
    );
    assert_eq!(h.view.overlays().search_results(2).len(), 1);
}

#[test]
fn test_recreated_overlay_replays_hits() {
    let mut h = open(sample_book());
    collect(&mut h, SearchOptions::new("whale"));
    h.view.on_unload(2);

    let drawn = h.show_section(2);
    assert_eq!(drawn.borrow().len(), 2);
    assert!(drawn.borrow().iter().all(|(_, _, style)| *style == DrawStyle::Outline));
}

#[test]
fn test_search_options_follow_settings() {
    let mut settings = folio::settings::Settings::default();
    settings.search.match_case = true;
    let mut h = common::open_with(sample_book(), settings);
    let options = h.view.search_options("WHALE");
    let events = collect(&mut h, options);
    assert_eq!(events.iter().filter(|e| matches!(e, SearchEvent::Section { .. })).count(), 0);
}
