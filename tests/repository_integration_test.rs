// ==========================================
// Repository 集成测试
// ==========================================
// 测试目标: SqliteCurriculumStore 写入 + CurriculumRepository / ImportBatchRepository 读取
// ==========================================

mod test_helpers;

use chrono::{Duration, Utc};
use curriculum_importer::domain::{ImportBatch, LessonGapFill, NewLesson, OrderedLink};
use curriculum_importer::repository::{
    CurriculumRepository, CurriculumStore, ImportBatchRepository, RepositoryError,
    SqliteCurriculumStore,
};
use test_helpers::{create_test_db, open_conn, seed_program};

fn batch(batch_id: &str, discipline_id: i64, minutes_ago: i64) -> ImportBatch {
    ImportBatch {
        batch_id: batch_id.to_string(),
        program_id: 1,
        discipline_id,
        topics_added: 1,
        lessons_added: 2,
        questions_added: 3,
        lessons_updated: 0,
        source_rows: 2,
        imported_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

#[test]
fn test_tree_follows_order_index() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let program_id = seed_program(&db_path, "Medicine");
    let conn = open_conn(&db_path);
    let store = SqliteCurriculumStore::new(&conn);

    let discipline_id = store.create_discipline("Bioethics", None, 1).unwrap();
    store
        .link_discipline_to_program(program_id, discipline_id, 1)
        .unwrap();

    // 先写入的主题排在后面
    let late = store.create_topic("Law", None, 2).unwrap();
    let early = store.create_topic("Ethics", None, 1).unwrap();
    store.link_topic_to_discipline(discipline_id, late, 2).unwrap();
    store.link_topic_to_discipline(discipline_id, early, 1).unwrap();

    let seminar = store.create_lesson_type("Семінар").unwrap();
    let lesson_id = store
        .create_lesson(&NewLesson {
            title: "Privacy".to_string(),
            lesson_type_id: Some(seminar),
            total_hours: Some(2.0),
            classroom_hours: Some(1.5),
            self_study_hours: Some(0.5),
        })
        .unwrap();
    store.link_lesson_to_topic(early, lesson_id, 1).unwrap();

    let second = store.create_question("Second?", None, 1).unwrap();
    let first = store.create_question("First?", None, 1).unwrap();
    store.link_question_to_lesson(lesson_id, second, 2).unwrap();
    store.link_question_to_lesson(lesson_id, first, 1).unwrap();

    let repo = CurriculumRepository::new(&db_path).unwrap();
    let tree = repo.discipline_tree(discipline_id).unwrap();

    let titles: Vec<&str> = tree.iter().map(|t| t.topic.title.as_str()).collect();
    assert_eq!(titles, vec!["Ethics", "Law"]);
    assert!(tree[1].lessons.is_empty());

    let node = &tree[0].lessons[0];
    assert_eq!(node.lesson_type.as_deref(), Some("Семінар"));
    assert_eq!(node.lesson.classroom_hours, Some(1.5));
    let questions: Vec<(i64, &str)> = node
        .questions
        .iter()
        .map(|(order, q)| (*order, q.content.as_str()))
        .collect();
    assert_eq!(questions, vec![(1, "First?"), (2, "Second?")]);

    assert_eq!(store.max_order_index(OrderedLink::DisciplineTopic, discipline_id).unwrap(), 2);
    assert_eq!(store.next_order_index(OrderedLink::TopicLesson, late).unwrap(), 1);

    let disciplines = repo.list_disciplines(program_id).unwrap();
    assert_eq!(disciplines.len(), 1);
    assert_eq!(disciplines[0].name, "Bioethics");
}

#[test]
fn test_link_constraints() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let program_id = seed_program(&db_path, "Medicine");
    let conn = open_conn(&db_path);
    let store = SqliteCurriculumStore::new(&conn);

    let discipline_id = store.create_discipline("Bioethics", None, 1).unwrap();
    store
        .link_discipline_to_program(program_id, discipline_id, 1)
        .unwrap();
    assert!(store
        .is_linked(OrderedLink::ProgramDiscipline, program_id, discipline_id)
        .unwrap());

    let err = store
        .link_discipline_to_program(program_id, discipline_id, 2)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));

    let err = store
        .link_discipline_to_program(program_id + 100, discipline_id, 1)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
}

#[test]
fn test_gap_patch_only_touches_given_fields() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_conn(&db_path);
    let store = SqliteCurriculumStore::new(&conn);

    let topic_id = store.create_topic("Ethics", None, 1).unwrap();
    let lesson_id = store
        .create_lesson(&NewLesson {
            title: "Consent".to_string(),
            total_hours: Some(2.0),
            ..Default::default()
        })
        .unwrap();
    store.link_lesson_to_topic(topic_id, lesson_id, 1).unwrap();

    store
        .update_lesson_gaps(
            lesson_id,
            &LessonGapFill {
                classroom_hours: Some(2.0),
                ..Default::default()
            },
        )
        .unwrap();

    let (total, classroom, self_study): (Option<f64>, Option<f64>, Option<f64>) = conn
        .query_row(
            "SELECT total_hours, classroom_hours, self_study_hours FROM lesson WHERE id = ?1",
            [lesson_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(total, Some(2.0));
    assert_eq!(classroom, Some(2.0));
    assert_eq!(self_study, None);
}

#[test]
fn test_missing_discipline_tree_is_not_found() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = CurriculumRepository::new(&db_path).unwrap();

    let err = repo.discipline_tree(404).unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    assert!(repo.find_program(404).unwrap().is_none());
    assert!(repo.list_programs().unwrap().is_empty());
}

#[test]
fn test_recent_batches_newest_first() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_conn(&db_path);
    let store = SqliteCurriculumStore::new(&conn);

    store.insert_import_batch(&batch("old", 7, 30)).unwrap();
    store.insert_import_batch(&batch("new", 7, 1)).unwrap();
    store.insert_import_batch(&batch("other", 8, 10)).unwrap();

    let repo = ImportBatchRepository::new(&db_path).unwrap();
    let ids: Vec<String> = repo
        .recent(10)
        .unwrap()
        .into_iter()
        .map(|b| b.batch_id)
        .collect();
    assert_eq!(ids, vec!["new", "other", "old"]);
    assert_eq!(repo.recent(2).unwrap().len(), 2);

    let found = repo.find("old").unwrap().expect("batch should exist");
    assert_eq!(found.questions_added, 3);
    assert_eq!(found.source_rows, 2);
    assert!(repo.find("missing").unwrap().is_none());
    assert_eq!(repo.count_for_discipline(7).unwrap(), 2);
}
