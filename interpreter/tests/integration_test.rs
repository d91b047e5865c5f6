use std::fs::File;
use std::io::Read;

use walkdir::WalkDir;

#[test]
fn test_programs() {
    let source_files = WalkDir::new("tests/programs")
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| matches!(entry.path().extension(), Some(extension) if extension == "thenga"))
        .filter_map(|entry| {
            let mut exp_filename = entry.file_name().to_os_string();
            exp_filename.push(".out");

            let parent = entry.path().parent().unwrap();
            let exp_filepath = parent.join(exp_filename);

            if exp_filepath.exists() {
                Some((entry, exp_filepath))
            } else {
                None
            }
        });

    let mut total = 0;

    for (src_path, exp_path) in source_files {
        println!("🕑 Running test: {}", src_path.path().display());

        let mut src_content = String::new();
        let mut exp_content = String::new();

        File::open(src_path.path())
            .unwrap()
            .read_to_string(&mut src_content)
            .unwrap();
        File::open(exp_path)
            .unwrap()
            .read_to_string(&mut exp_content)
            .unwrap();

        // output written before a failure is kept, the error goes on the last line
        let mut output: Vec<u8> = Vec::new();
        let res = thenga::run(&src_content, &mut output, None);
        let mut actual = String::from_utf8(output).unwrap();
        if let Err(err) = res {
            actual.push_str(&err.to_string());
            actual.push('\n');
        }

        assert_eq!(exp_content, actual, "{}", src_path.path().display());

        println!("✅ Test complete: {}", src_path.path().display());
        total += 1;
    }

    assert!(total > 0, "no programs found under tests/programs");
    println!("✅ Ran {} tests", total)
}
