//! Diff engine: source state + target state -> action plan
//!
//! Pure and deterministic. Notes are matched by identity, never by path, so a
//! renamed or re-decked note becomes a move instead of a delete + create.

use std::collections::{BTreeMap, BTreeSet};

use deck_fs::{MirrorPath, NormalizedPath, content_hash};

use crate::index::IndexGenerator;
use crate::model::NoteId;
use crate::plan::{ActionPlan, NoteConflict, NoteCreate, NoteDelete, NoteUpdate};
use crate::source::SourceState;
use crate::target::{TargetNoteFile, TargetState};

/// Compute every mutation needed to make the destination mirror the source.
pub fn compute_plan(source: &SourceState, target: &TargetState) -> ActionPlan {
    let mut plan = ActionPlan {
        folders_to_create: diff_folders(source, target),
        ..ActionPlan::default()
    };
    diff_notes(source, target, &mut plan);
    diff_assets(source, target, &mut plan);
    diff_indexes(source, target, &mut plan);

    tracing::debug!(summary = ?plan.summary(), "Computed action plan");
    plan
}

fn diff_folders(source: &SourceState, target: &TargetState) -> BTreeSet<NormalizedPath> {
    source
        .decks()
        .filter(|deck| !deck.is_root() && !target.folders.contains(&deck.path))
        .map(|deck| deck.path.clone())
        .collect()
}

/// Target note files by identity. When several files claim one identity the
/// smallest path wins and the others stay unmatched.
fn files_by_identity(target: &TargetState) -> BTreeMap<NoteId, &TargetNoteFile> {
    let mut by_id: BTreeMap<NoteId, &TargetNoteFile> = BTreeMap::new();
    for file in target.notes.values() {
        match by_id.get(&file.note_id) {
            Some(kept) => {
                tracing::warn!(
                    note_id = file.note_id,
                    kept = %kept.path,
                    duplicate = %file.path,
                    "Several files claim the same note identity"
                );
            }
            None => {
                by_id.insert(file.note_id, file);
            }
        }
    }
    by_id
}

fn diff_notes(source: &SourceState, target: &TargetState, plan: &mut ActionPlan) {
    let by_id = files_by_identity(target);
    let mut matched: BTreeSet<&NormalizedPath> = BTreeSet::new();

    let mut notes: Vec<_> = source.notes().collect();
    notes.sort_by_key(|(_, note)| note.id);

    for (deck, note) in notes {
        let canonical = deck.note_path(note);
        let occupied = target.unmanaged.contains(&canonical);
        let Some(file) = by_id.get(&note.id) else {
            if occupied {
                plan.notes_blocked.push(blocked(note.id, canonical));
            } else {
                plan.notes_to_create.push(NoteCreate {
                    note_id: note.id,
                    target: canonical,
                });
            }
            continue;
        };
        matched.insert(&file.path);

        let needs_move = file.path != canonical;
        if needs_move && occupied {
            plan.notes_blocked.push(blocked(note.id, canonical));
            continue;
        }
        let stale = file.mod_time.is_none_or(|recorded| note.mod_time > recorded);
        if needs_move || stale {
            plan.notes_to_update.push(NoteUpdate {
                note_id: note.id,
                target: canonical,
                current: file.path.clone(),
                needs_move,
                stale,
            });
        }
    }

    plan.notes_to_delete = target
        .notes
        .values()
        .filter(|file| !matched.contains(&file.path))
        .map(|file| NoteDelete {
            path: file.path.clone(),
            note_id: file.note_id,
        })
        .collect();
}

/// An unmanaged file sits where the note would be written.
fn blocked(note_id: NoteId, path: NormalizedPath) -> NoteConflict {
    tracing::warn!(note_id, %path, "Target path is taken by a file without a note identity");
    NoteConflict { note_id, path }
}

fn diff_assets(source: &SourceState, target: &TargetState, plan: &mut ActionPlan) {
    let required = source.referenced_media();
    plan.assets_to_copy = required.difference(&target.assets).cloned().collect();
    plan.assets_to_delete = target.assets.difference(&required).cloned().collect();
}

fn diff_indexes(source: &SourceState, target: &TargetState, plan: &mut ActionPlan) {
    let generator = IndexGenerator::new(source);
    let expected = generator.expected();
    let found: BTreeSet<NormalizedPath> = target.index_documents.keys().cloned().collect();

    plan.indexes_to_create = expected.difference(&found).cloned().collect();
    plan.indexes_to_delete = found.difference(&expected).cloned().collect();
    plan.indexes_to_update = expected
        .intersection(&found)
        .filter(|path| {
            let current = target.index_documents.get(*path).map(String::as_str);
            current != Some(content_hash(&generator.render(path)).as_str())
        })
        .cloned()
        .collect();

    let root = NormalizedPath::new(MirrorPath::RootIndex.as_str());
    let others_changed = plan.has_content_changes()
        || !plan.indexes_to_create.is_empty()
        || !plan.indexes_to_delete.is_empty();
    if others_changed && !plan.indexes_to_create.contains(&root) {
        plan.indexes_to_update.insert(root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CardEntry, CollectionSnapshot, DeckEntry, NoteEntry, NoteTypeEntry, SnapshotData};
    use crate::progress::NoProgress;
    use crate::source::SourceBuilder;
    use pretty_assertions::assert_eq;

    fn source(notes: &[(i64, &str, &str, i64)]) -> SourceState {
        let mut decks: Vec<DeckEntry> = Vec::new();
        let mut note_entries = Vec::new();
        let mut cards = Vec::new();
        for (id, deck, front, mod_time) in notes {
            let deck_id = match decks.iter().find(|d| d.name == *deck) {
                Some(d) => d.id,
                None => {
                    let deck_id = decks.len() as i64 + 1;
                    decks.push(DeckEntry { id: deck_id, name: deck.to_string() });
                    deck_id
                }
            };
            note_entries.push(NoteEntry {
                id: *id,
                mod_time: *mod_time,
                note_type: 1,
                fields: vec![front.to_string(), String::new()],
                cards: vec![],
            });
            cards.push(CardEntry { id: id * 10, note: *id, deck: deck_id });
        }
        let snapshot: CollectionSnapshot = SnapshotData {
            decks,
            note_types: vec![NoteTypeEntry {
                id: 1,
                name: "Basic".into(),
                fields: vec!["Front".into(), "Back".into()],
            }],
            notes: note_entries,
            cards,
        }
        .into();
        SourceBuilder::new(&snapshot).build(&NoProgress).unwrap()
    }

    fn note_file(path: &str, note_id: i64, mod_time: Option<i64>) -> (NormalizedPath, TargetNoteFile) {
        let path = NormalizedPath::new(path);
        (
            path.clone(),
            TargetNoteFile {
                path,
                note_id,
                mod_time,
                content_hash: None,
            },
        )
    }

    fn target(folders: &[&str], notes: Vec<(NormalizedPath, TargetNoteFile)>) -> TargetState {
        TargetState {
            folders: folders.iter().map(NormalizedPath::new).collect(),
            notes: notes.into_iter().collect(),
            ..TargetState::default()
        }
    }

    fn root_index() -> NormalizedPath {
        NormalizedPath::new("_Anki_Collection_Index.md")
    }

    #[test]
    fn empty_destination_creates_everything() {
        let src = source(&[(1, "Languages::Spanish", "Hola", 5)]);
        let plan = compute_plan(&src, &TargetState::default());

        assert_eq!(
            plan.folders_to_create,
            BTreeSet::from([NormalizedPath::new("Languages"), NormalizedPath::new("Languages/Spanish")])
        );
        assert_eq!(
            plan.notes_to_create,
            vec![NoteCreate {
                note_id: 1,
                target: NormalizedPath::new("Languages/Spanish/Hola_1.md"),
            }]
        );
        assert!(plan.indexes_to_create.contains(&NormalizedPath::new("Languages/Spanish/_Spanish_index.md")));
        assert!(plan.indexes_to_create.contains(&root_index()));
        assert!(!plan.indexes_to_update.contains(&root_index()));
    }

    #[test]
    fn older_recorded_timestamp_updates_in_place() {
        let src = source(&[(1, "Languages::Spanish", "Hola", 5)]);
        let tgt = target(
            &["Languages", "Languages/Spanish"],
            vec![note_file("Languages/Spanish/Hola_1.md", 1, Some(4))],
        );
        let plan = compute_plan(&src, &tgt);

        assert_eq!(plan.notes_to_update.len(), 1);
        assert!(!plan.notes_to_update[0].needs_move);
        assert!(plan.notes_to_update[0].stale);
        assert!(plan.notes_to_create.is_empty());
        assert!(plan.notes_to_delete.is_empty());
    }

    #[test]
    fn unknown_timestamp_is_stale() {
        let src = source(&[(1, "Spanish", "Hola", 5)]);
        let tgt = target(&["Spanish"], vec![note_file("Spanish/Hola_1.md", 1, None)]);
        let plan = compute_plan(&src, &tgt);
        assert!(plan.notes_to_update[0].stale);
    }

    #[test]
    fn up_to_date_note_is_left_alone() {
        let src = source(&[(1, "Spanish", "Hola", 5)]);
        let tgt = target(&["Spanish"], vec![note_file("Spanish/Hola_1.md", 1, Some(5))]);
        let plan = compute_plan(&src, &tgt);
        assert!(plan.notes_to_update.is_empty());
        assert!(plan.notes_to_create.is_empty());
    }

    #[test]
    fn renamed_note_is_a_move_not_a_delete() {
        let src = source(&[(1, "Spanish", "Buenos dias", 5)]);
        let tgt = target(&["Spanish"], vec![note_file("Spanish/Hola_1.md", 1, Some(5))]);
        let plan = compute_plan(&src, &tgt);

        assert_eq!(
            plan.notes_to_update,
            vec![NoteUpdate {
                note_id: 1,
                target: NormalizedPath::new("Spanish/Buenos dias_1.md"),
                current: NormalizedPath::new("Spanish/Hola_1.md"),
                needs_move: true,
                stale: false,
            }]
        );
        assert!(plan.notes_to_delete.is_empty());
        assert!(plan.indexes_to_update.contains(&root_index()));
    }

    #[test]
    fn unmanaged_file_at_target_path_blocks_create() {
        let src = source(&[(1, "Spanish", "Hola", 5)]);
        let mut tgt = target(&["Spanish"], vec![]);
        tgt.unmanaged.insert(NormalizedPath::new("Spanish/Hola_1.md"));
        let plan = compute_plan(&src, &tgt);

        assert!(plan.notes_to_create.is_empty());
        assert_eq!(
            plan.notes_blocked,
            vec![NoteConflict {
                note_id: 1,
                path: NormalizedPath::new("Spanish/Hola_1.md"),
            }]
        );
    }

    #[test]
    fn unmanaged_file_at_move_target_keeps_current_file() {
        let src = source(&[(1, "Spanish", "Buenos dias", 5)]);
        let mut tgt = target(&["Spanish"], vec![note_file("Spanish/Hola_1.md", 1, Some(4))]);
        tgt.unmanaged.insert(NormalizedPath::new("Spanish/Buenos dias_1.md"));
        let plan = compute_plan(&src, &tgt);

        assert!(plan.notes_to_update.is_empty());
        assert!(plan.notes_to_delete.is_empty());
        assert_eq!(plan.notes_blocked.len(), 1);
        assert_eq!(plan.notes_blocked[0].path.as_str(), "Spanish/Buenos dias_1.md");
    }

    #[test]
    fn orphan_file_is_only_deleted() {
        let src = source(&[(1, "Spanish", "Hola", 5)]);
        let tgt = target(
            &["Spanish"],
            vec![
                note_file("Spanish/Hola_1.md", 1, Some(5)),
                note_file("Spanish/Adios_2.md", 2, Some(5)),
            ],
        );
        let plan = compute_plan(&src, &tgt);

        assert_eq!(
            plan.notes_to_delete,
            vec![NoteDelete {
                path: NormalizedPath::new("Spanish/Adios_2.md"),
                note_id: 2,
            }]
        );
        assert!(plan.notes_to_create.iter().all(|c| c.note_id != 2));
        assert!(plan.notes_to_update.iter().all(|u| u.note_id != 2));
    }

    #[test]
    fn duplicate_identity_keeps_smallest_path() {
        let src = source(&[(1, "Spanish", "Hola", 5)]);
        let tgt = target(
            &["Spanish", "Old"],
            vec![
                note_file("Spanish/Hola_1.md", 1, Some(5)),
                note_file("Old/Hola_1.md", 1, Some(5)),
            ],
        );
        let plan = compute_plan(&src, &tgt);

        assert_eq!(plan.notes_to_update.len(), 1);
        assert_eq!(plan.notes_to_update[0].current, NormalizedPath::new("Old/Hola_1.md"));
        assert!(plan.notes_to_update[0].needs_move);
        assert_eq!(
            plan.notes_to_delete,
            vec![NoteDelete {
                path: NormalizedPath::new("Spanish/Hola_1.md"),
                note_id: 1,
            }]
        );
    }

    #[test]
    fn asset_sets() {
        let src = source(&[(1, "Spanish", "<img src=\"perro.png\">Perro", 5)]);
        let mut tgt = target(&["Spanish"], vec![]);
        tgt.assets.insert("old.png".to_string());
        let plan = compute_plan(&src, &tgt);

        assert_eq!(plan.assets_to_copy, BTreeSet::from(["perro.png".to_string()]));
        assert_eq!(plan.assets_to_delete, BTreeSet::from(["old.png".to_string()]));
    }

    #[test]
    fn matching_indexes_produce_empty_plan() {
        let src = source(&[(1, "Spanish", "Hola", 5)]);
        let generator = IndexGenerator::new(&src);
        let mut tgt = target(&["Spanish"], vec![note_file("Spanish/Hola_1.md", 1, Some(5))]);
        for path in generator.expected() {
            let hash = content_hash(&generator.render(&path));
            tgt.index_documents.insert(path, hash);
        }
        assert!(compute_plan(&src, &tgt).is_empty());
    }

    #[test]
    fn stale_index_is_updated_and_extra_index_deleted() {
        let src = source(&[(1, "Spanish", "Hola", 5)]);
        let generator = IndexGenerator::new(&src);
        let mut tgt = target(&["Spanish"], vec![note_file("Spanish/Hola_1.md", 1, Some(5))]);
        tgt.index_documents
            .insert(root_index(), content_hash(&generator.render(&root_index())));
        tgt.index_documents
            .insert(NormalizedPath::new("Spanish/_Spanish_index.md"), "outdated".to_string());
        tgt.index_documents
            .insert(NormalizedPath::new("French/_French_index.md"), "x".to_string());

        let plan = compute_plan(&src, &tgt);
        assert_eq!(
            plan.indexes_to_update,
            BTreeSet::from([NormalizedPath::new("Spanish/_Spanish_index.md"), root_index()])
        );
        assert_eq!(
            plan.indexes_to_delete,
            BTreeSet::from([NormalizedPath::new("French/_French_index.md")])
        );
        assert!(plan.indexes_to_create.is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const DECKS: [&str; 3] = ["Alpha", "Alpha::Beta", "Gamma"];

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn every_identity_lands_in_one_category(
                notes in prop::collection::btree_map(1i64..40, (0usize..3, "[a-z]{1,6}", 0i64..5), 0..12),
                files in prop::collection::btree_map(1i64..60, (0usize..3, prop::option::of(0i64..5)), 0..12),
            ) {
                let rows: Vec<(i64, &str, &str, i64)> = notes
                    .iter()
                    .map(|(id, (deck, front, mod_time))| (*id, DECKS[*deck], front.as_str(), *mod_time))
                    .collect();
                let src = source(&rows);
                let tgt = target(
                    &[],
                    files
                        .iter()
                        .map(|(id, (deck, mod_time))| {
                            let folder = DECKS[*deck].replace("::", "/");
                            note_file(&format!("{folder}/File_{id}.md"), *id, *mod_time)
                        })
                        .collect(),
                );

                let plan = compute_plan(&src, &tgt);
                let created: BTreeSet<i64> = plan.notes_to_create.iter().map(|c| c.note_id).collect();
                let updated: BTreeSet<i64> = plan.notes_to_update.iter().map(|u| u.note_id).collect();
                let deleted: BTreeSet<i64> = plan.notes_to_delete.iter().map(|d| d.note_id).collect();

                for id in notes.keys() {
                    prop_assert!(!deleted.contains(id));
                    prop_assert_eq!(created.contains(id), !files.contains_key(id));
                    if files.contains_key(id) {
                        prop_assert!(updated.contains(id), "file names never match canonical names here");
                    }
                }
                for id in files.keys() {
                    prop_assert_eq!(deleted.contains(id), !notes.contains_key(id));
                }
                prop_assert_eq!(compute_plan(&src, &tgt), plan);
            }
        }
    }
}
