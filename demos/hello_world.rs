use lazy_file::LazyFile;

fn main() {
    let tmp = std::env::temp_dir();
    println!("Temp dir: {}", tmp.display());

    let path = tmp.join("lazy_file_demo").join("docs").join("first.txt");

    // nothing is touched on the host yet
    let file = LazyFile::new(&path);
    println!("Exists before first write: {}", file.exists().unwrap());

    // the first write creates `lazy_file_demo/docs` and the file itself;
    // the second one appends to the already open file
    file.write(b"Hello").unwrap();
    file.write(b", World!").unwrap();

    let location = file.location().unwrap();
    println!("Written to {} in {}", location.file_name(), location.dir().display());

    // `exists` did not find the file earlier, so the reader was re-armed and sees it now
    let content = file.read().unwrap();
    println!("{}", String::from_utf8(content).unwrap());

    file.close().unwrap();
    std::fs::remove_dir_all(tmp.join("lazy_file_demo")).unwrap();
}
