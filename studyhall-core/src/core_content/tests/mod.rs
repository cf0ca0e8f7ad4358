/*
    Integration tests for the classroom content service

    Scenario coverage:
    - Classroom lifecycle, join codes and membership rules
    - Posting, commenting and attachment batches
    - The submission write path and its compensation
    - Grading rules, conflicts and revisions
*/

pub mod support;

pub mod content_tests;
