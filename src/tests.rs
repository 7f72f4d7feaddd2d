#[cfg(test)]
mod tests {
  use std::fs;
  use std::io::Cursor;
  use std::path::{Path, PathBuf};

  use pretty_assertions::assert_eq;
  use tempfile::tempdir;

  use super::super::code_writer::CodeWriter;
  use super::super::diagnostics::Warning;
  use super::super::error::CmacsError;
  use super::super::implementation::ForwardingFunction;
  use super::super::model::{assemble, FieldType};
  use super::super::options::{GeneratorOptions, GuardStyle, OutputPaths};
  use super::super::region::build_regions;
  use super::super::scanner::scan;
  use super::super::{process_file, process_files, transform};

  const DEMO: &str = include_str!("../demos/example.cm.cpp");

  fn demo_options() -> GeneratorOptions {
    GeneratorOptions::for_input(Path::new("example.cm.cpp"))
  }

  /// A minimal document around the given class body
  fn document(class_body: &str) -> String {
    format!(
      "#pragma cmacs namespace App\n\n#pragma cmacs class\nclass Widget {{\npublic:\n{}\n}};\n",
      class_body
    )
  }

  const MAIN: &str = "  #pragma cmacs main\n  int main(int argc, char** argv) {\n    return 0;\n  }\n";

  #[test]
  fn test_code_writer_class_declaration() {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = CodeWriter::with_indent_size(&mut buffer, 4);

    writer.begin_namespace("Example").unwrap();
    writer.writeln("class Main {").unwrap();
    writer.indent();
    assert_eq!(writer.indent_level(), 1);
    writer.write_access_specifier("public:").unwrap();
    writer.writeln("static int main(int argc, char** argv);").unwrap();
    writer.write_access_specifier("private:").unwrap();
    writer.writeln("int foo_;").unwrap();
    writer.dedent();
    writer.writeln("};").unwrap();
    writer.end_namespace("Example").unwrap();
    writer.flush().unwrap();

    let result = String::from_utf8(buffer.into_inner()).unwrap();
    let expected = "namespace Example {\nclass Main {\npublic:\n    static int main(int argc, char** argv);\nprivate:\n    int foo_;\n};\n} // namespace Example\n";
    assert_eq!(result, expected);
  }

  #[test]
  fn test_code_writer_forwarding_function() {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = CodeWriter::new(&mut buffer);

    writer.write_include("example.cm.cpp.hpp", false).unwrap();
    writer.newline().unwrap();
    ForwardingFunction::new("int", "main")
      .param("int", "argc")
      .param("char**", "argv")
      .forward_to("::Example::Main::main", &["argc", "argv"])
      .write(&mut writer)
      .unwrap();

    let result = String::from_utf8(buffer.into_inner()).unwrap();
    let expected = "#include \"example.cm.cpp.hpp\"\n\nint main(int argc, char** argv) {\n  return ::Example::Main::main(argc, argv);\n}\n";
    assert_eq!(result, expected);
  }

  #[test]
  fn test_code_writer_guards_and_blocks() {
    let text = CodeWriter::render(2, |w| {
      w.write_ifndef("DEMO_HPP")?;
      w.write_define("DEMO_HPP", None)?;
      w.write_define("LIMIT", Some("8"))?;
      w.write_block("\n    int a;\n      int b;\n")?;
      w.write_comment("first\nsecond")?;
      w.write_endif(Some("DEMO_HPP"))
    })
    .unwrap();

    let expected = "#ifndef DEMO_HPP\n#define DEMO_HPP\n#define LIMIT 8\nint a;\n  int b;\n/*\n * first\n * second\n */\n#endif // DEMO_HPP\n";
    assert_eq!(text, expected);
  }

  #[test]
  fn test_demo_header() {
    let artifacts = transform(DEMO, &demo_options()).unwrap();

    let expected = r#"// Generated by cmacs. Do not edit.
#pragma once

#include <iostream>

namespace Example {

//using namespace foo;
// Here goes code which will be available to both header and implementation(s)

class Main {
public:
  // Note that you cannot omit names of cpp-used namespaces in argument declarations and other header-side code snippets
  Main(int foo, int bar, const std::string& baz);
  virtual ~Main();
  int foo_plus_bar();
  static int main(int argc, char** argv);
private:
  int foo_;
  int bar_;
  std::string baz_;
};

} // namespace Example
"#;
    assert_eq!(artifacts.header, expected);
    assert!(artifacts.warnings.is_empty());
  }

  #[test]
  fn test_demo_implementation() {
    let artifacts = transform(DEMO, &demo_options()).unwrap();
    let cpp = &artifacts.implementation;

    assert!(cpp.starts_with("// Generated by cmacs. Do not edit.\n#include \"example.cm.cpp.hpp\"\n"));
    assert!(cpp.contains("using namespace Example;\n"));
    assert!(cpp.contains("using namespace std;\n"));
    assert!(cpp.contains(
      "Example::Main::Main(int foo, int bar, const std::string& baz)\n  : foo_(foo)\n  , bar_(bar)\n  , baz_(baz)\n{\n"
    ));
    assert!(cpp.contains("Example::Main::~Main()\n{\n    // some code\n}\n"));
    assert!(cpp.contains("int Example::Main::foo_plus_bar()\n{\n    return foo_ + bar_;\n}\n"));
    assert!(cpp.contains("int Example::Main::main(int argc, char** argv)\n{\n"));
    assert!(cpp.ends_with(
      "int main(int argc, char** argv) {\n  return ::Example::Main::main(argc, argv);\n}\n"
    ));

    // bodies never leak into the header
    assert!(!artifacts.header.contains("Hello, World!"));
    assert!(!artifacts.header.contains("return foo_ + bar_;"));
  }

  #[test]
  fn test_output_is_deterministic() {
    let first = transform(DEMO, &demo_options()).unwrap();
    let second = transform(DEMO, &demo_options()).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn test_definitions_keep_member_order() {
    let source = document(&format!(
      "  #pragma cmacs method\n  int zeta() {{ return 1; }}\n  #pragma cmacs method\n  int alpha() {{ return 2; }}\n{}  #pragma cmacs method\n  int mid() {{ return 3; }}\n",
      MAIN
    ));
    let artifacts = transform(&source, &GeneratorOptions::default()).unwrap();
    let cpp = &artifacts.implementation;

    let zeta = cpp.find("App::Widget::zeta").unwrap();
    let alpha = cpp.find("App::Widget::alpha").unwrap();
    let main = cpp.find("App::Widget::main").unwrap();
    let mid = cpp.find("App::Widget::mid").unwrap();
    assert!(zeta < alpha && alpha < main && main < mid);
  }

  #[test]
  fn test_field_inference_round_trip() {
    let source = document(&format!(
      "  #pragma cmacs constructor\n  Widget(int width, const std::string& label)\n  : width_(width)\n  , label_(label)\n  {{}}\n{}",
      MAIN
    ));
    let regions = build_regions(scan(&source).unwrap()).unwrap();
    let assembly = assemble(&regions).unwrap();

    assert!(assembly.warnings.is_empty());
    let fields: Vec<(&str, &FieldType)> = assembly
      .class
      .fields
      .iter()
      .map(|f| (f.name.as_str(), &f.ty))
      .collect();
    assert_eq!(
      fields,
      vec![
        ("width_", &FieldType::Declared("int".to_string())),
        ("label_", &FieldType::Declared("std::string".to_string())),
      ]
    );

    let header = transform(&source, &GeneratorOptions::default()).unwrap().header;
    assert!(header.contains("private:\n  int width_;\n  std::string label_;\n};\n"));
  }

  const SCENARIO_CTOR: &str = "  #pragma cmacs constructor\n  Widget(int foo, int bar, std::string baz)\n  : foo_(foo)\n  , bar_(bar)\n  {\n  }\n  #pragma cmacs method\n  int sum() {\n    return foo_ + bar_;\n  }\n";

  #[test]
  fn test_unused_parameter_without_declared_field() {
    let source = document(&format!("{}{}", SCENARIO_CTOR, MAIN));
    let artifacts = transform(&source, &GeneratorOptions::default()).unwrap();

    assert!(artifacts.header.contains("  int foo_;\n  int bar_;\n"));
    assert!(!artifacts.header.contains("baz_"));
    assert_eq!(
      artifacts.warnings,
      vec![Warning::UnusedConstructorParameter {
        parameter: "baz".to_string(),
        line: 6,
      }]
    );

    // three member definitions plus the free entry point
    let cpp = &artifacts.implementation;
    assert_eq!(cpp.matches("App::Widget::").count(), 4);
    assert!(cpp.contains("return ::App::Widget::main(argc, argv);"));
  }

  #[test]
  fn test_unused_parameter_with_declared_field() {
    let source = document(&format!(
      "{}{}private:\n  std::string baz_;\n",
      SCENARIO_CTOR, MAIN
    ));
    let artifacts = transform(&source, &GeneratorOptions::default()).unwrap();

    assert!(artifacts.warnings.is_empty());
    assert!(artifacts.header.contains("private:\n  std::string baz_;\nprivate:\n  int foo_;\n  int bar_;\n};\n"));
  }

  #[test]
  fn test_ambiguous_field_type() {
    let source = document(&format!(
      "  #pragma cmacs constructor\n  Widget() : count_(0) {{}}\n{}",
      MAIN
    ));
    let artifacts = transform(&source, &GeneratorOptions::default()).unwrap();

    assert_eq!(
      artifacts.warnings,
      vec![Warning::AmbiguousFieldType {
        field: "count_".to_string(),
        line: 6,
      }]
    );
    assert!(artifacts
      .header
      .contains("  auto /* cmacs: unresolved type */ count_;\n"));
  }

  #[test]
  fn test_member_outside_class() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("widget.cm.cpp");
    fs::write(
      &input,
      "#pragma cmacs includes\n{\n}\n#pragma cmacs constructor\nWidget() {}\n",
    )
    .unwrap();

    let err = process_file(&input, false, &GeneratorOptions::default()).unwrap_err();
    match err {
      CmacsError::MemberOutsideClass { tag, line } => {
        assert_eq!(tag, "constructor");
        assert_eq!(line, 4);
      }
      other => panic!("unexpected error: {other}"),
    }

    let paths = OutputPaths::for_input(&input, false);
    assert!(!paths.header.exists());
    assert!(!paths.implementation.exists());
  }

  #[test]
  fn test_missing_entry_point() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("widget.cm.cpp");
    fs::write(
      &input,
      document("  #pragma cmacs method\n  void run() {}\n"),
    )
    .unwrap();

    let err = process_file(&input, false, &GeneratorOptions::default()).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::MissingEntryPoint { ref class, line: 3 } if class == "Widget"
    ));
    assert!(!OutputPaths::for_input(&input, false).header.exists());
  }

  #[test]
  fn test_unknown_directive() {
    let err = transform("#pragma cmacs banana\n", &GeneratorOptions::default()).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::UnknownDirectiveKind { ref tag, line: 1 } if tag == "banana"
    ));
  }

  #[test]
  fn test_unterminated_region() {
    let err = transform(
      "\n#pragma cmacs cpp\n{\n  using namespace std;\n",
      &GeneratorOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
      err,
      CmacsError::UnterminatedRegion { ref tag, line: 2 } if tag == "cpp"
    ));

    let err = transform(&document(MAIN).replace("};\n", ""), &GeneratorOptions::default())
      .unwrap_err();
    assert!(matches!(
      err,
      CmacsError::UnterminatedRegion { ref tag, line: 3 } if tag == "class"
    ));
  }

  #[test]
  fn test_entry_point_arity_mismatch() {
    let source = document("  #pragma cmacs main\n  int main(int argc) {\n    return argc;\n  }\n");
    let err = transform(&source, &GeneratorOptions::default()).unwrap_err();
    assert!(matches!(err, CmacsError::EntryPointArityMismatch { line: 6, .. }));

    let source = document("  #pragma cmacs main\n  void main() {}\n");
    let err = transform(&source, &GeneratorOptions::default()).unwrap_err();
    assert!(matches!(err, CmacsError::EntryPointArityMismatch { .. }));
  }

  #[test]
  fn test_entry_point_without_arguments() {
    let source = document("  #pragma cmacs main\n  int main() {\n    return 0;\n  }\n");
    let cpp = transform(&source, &GeneratorOptions::default())
      .unwrap()
      .implementation;
    assert!(cpp.contains("int main(int argc, char** argv) {\n  return ::App::Widget::main();\n}\n"));
  }

  #[test]
  fn test_duplicate_entry_point() {
    let source = document(&format!("{}{}", MAIN, MAIN));
    let err = transform(&source, &GeneratorOptions::default()).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::DuplicateEntryPoint {
        line: 10,
        first_line: 6
      }
    ));
  }

  #[test]
  fn test_cpp_preamble_is_deduplicated() {
    let source = format!(
      "#pragma cmacs cpp\n{{\n  using namespace std;\n}}\n#pragma cmacs cppbody\n{{\n  using namespace std;\n  static int counter = 0;\n}}\n{}",
      document(MAIN)
    );
    let cpp = transform(&source, &GeneratorOptions::default())
      .unwrap()
      .implementation;
    assert_eq!(cpp.matches("using namespace std;").count(), 1);
    assert!(cpp.contains("using namespace std;\nstatic int counter = 0;\n"));
  }

  #[test]
  fn test_placement_aliases() {
    let source = format!(
      "#pragma cmacs hppstart\n{{\n#include <vector>\n}}\n#pragma cmacs hppend\n{{\n// after namespace\n}}\n#pragma cmacs cppstart\n{{\n#include <cstdio>\n}}\n#pragma cmacs cppend\n{{\n// tail\n}}\n{}",
      document(MAIN)
    );
    let artifacts = transform(&source, &GeneratorOptions::default()).unwrap();

    let header = &artifacts.header;
    let vector = header.find("#include <vector>").unwrap();
    let ns_open = header.find("namespace App {").unwrap();
    let ns_close = header.find("} // namespace App").unwrap();
    let after = header.find("// after namespace").unwrap();
    assert!(vector < ns_open && ns_close < after);

    let cpp = &artifacts.implementation;
    let include = cpp.find("#include \"output.hpp\"").unwrap();
    let cstdio = cpp.find("#include <cstdio>").unwrap();
    let using = cpp.find("using namespace App;").unwrap();
    assert!(include < cstdio && cstdio < using);
    assert!(cpp.ends_with("}\n\n// tail\n"));
  }

  #[test]
  fn test_loose_text_keeps_position() {
    let source = format!("struct Forward;\n{}int helper_value = 0;\n", document(MAIN));
    let header = transform(&source, &GeneratorOptions::default())
      .unwrap()
      .header;

    let forward = header.find("struct Forward;").unwrap();
    let class = header.find("class Widget {").unwrap();
    let helper = header.find("int helper_value = 0;").unwrap();
    assert!(forward < class && class < helper);
  }

  #[test]
  fn test_macro_guard() {
    let options = GeneratorOptions::for_input(Path::new("widget.cm.cpp")).with_guard(GuardStyle::Macro);
    let header = transform(&document(MAIN), &options).unwrap().header;

    assert!(header.contains("#ifndef WIDGET_CM_CPP_HPP\n#define WIDGET_CM_CPP_HPP\n"));
    assert!(header.ends_with("#endif // WIDGET_CM_CPP_HPP\n"));
    assert!(!header.contains("#pragma once"));
  }

  #[test]
  fn test_indent_size() {
    let options = GeneratorOptions::default().with_indent_size(4);
    let header = transform(&document(MAIN), &options).unwrap().header;
    assert!(header.contains("public:\n    static int main(int argc, char** argv);\n"));
  }

  #[test]
  fn test_output_paths() {
    let paths = OutputPaths::for_input(Path::new("src/example.cm.cpp"), false);
    assert_eq!(paths.header, Path::new("src/example.cm.cpp.hpp"));
    assert_eq!(paths.implementation, Path::new("src/example.cm.cpp.cpp"));

    let here = OutputPaths::for_input(Path::new("src/example.cm.cpp"), true);
    assert_eq!(here.header, Path::new("example.cm.cpp.hpp"));
  }

  #[test]
  fn test_process_file_writes_both_artifacts() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("example.cm.cpp");
    fs::write(&input, DEMO).unwrap();

    let (paths, artifacts) = process_file(&input, false, &GeneratorOptions::default()).unwrap();

    assert_eq!(paths.header, dir.path().join("example.cm.cpp.hpp"));
    assert_eq!(fs::read_to_string(&paths.header).unwrap(), artifacts.header);
    assert_eq!(
      fs::read_to_string(&paths.implementation).unwrap(),
      artifacts.implementation
    );
    assert!(artifacts
      .implementation
      .contains("#include \"example.cm.cpp.hpp\""));
  }

  #[test]
  fn test_cpp_block_keeps_repeated_lines() {
    let source = format!(
      "#pragma cmacs cpp\n{{\n  static int one() {{\n    return 1;\n  }}\n  static int two() {{\n    return 1;\n  }}\n}}\n{}",
      document(MAIN)
    );
    let cpp = transform(&source, &GeneratorOptions::default())
      .unwrap()
      .implementation;

    assert!(cpp.contains(
      "static int one() {\n  return 1;\n}\nstatic int two() {\n  return 1;\n}\n"
    ));
    assert_eq!(cpp.matches("return 1;").count(), 2);
  }

  #[test]
  fn test_identical_cpp_blocks_emitted_once() {
    let helper = "#pragma cmacs cpp\n{\n  static int one() {\n    return 1;\n  }\n}\n";
    let source = format!("{}{}{}", helper, helper, document(MAIN));
    let cpp = transform(&source, &GeneratorOptions::default())
      .unwrap()
      .implementation;
    assert_eq!(cpp.matches("static int one()").count(), 1);
  }

  #[test]
  fn test_explicit_field_with_call_initializer() {
    let source = document(&format!(
      "  #pragma cmacs constructor\n  Widget() : count_(0) {{}}\n{}private:\n  long count_ = compute(1);\n",
      MAIN
    ));
    let artifacts = transform(&source, &GeneratorOptions::default()).unwrap();

    assert!(artifacts.warnings.is_empty());
    assert_eq!(artifacts.header.matches(" count_").count(), 1);
    assert!(artifacts.header.contains("private:\n  long count_ = compute(1);\n};\n"));
  }

  #[test]
  fn test_process_files_continues_after_failure() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("bad.cm.cpp");
    let good = dir.path().join("good.cm.cpp");
    fs::write(&bad, "#pragma cmacs banana\n").unwrap();
    fs::write(&good, document(MAIN)).unwrap();

    let inputs: Vec<PathBuf> = vec![bad.clone(), good.clone()];
    let outcomes = process_files(&inputs, false, &GeneratorOptions::default());

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
      outcomes[0],
      Err(CmacsError::UnknownDirectiveKind { line: 1, .. })
    ));
    assert!(outcomes[1].is_ok());
    assert!(!OutputPaths::for_input(&bad, false).header.exists());
    let paths = OutputPaths::for_input(&good, false);
    assert!(paths.header.exists());
    assert!(paths.implementation.exists());
  }

  #[test]
  fn test_failed_write_names_path_and_keeps_previous_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("widget.cm.cpp");
    let paths = OutputPaths::for_input(&input, false);
    fs::write(&paths.implementation, "// previous\n").unwrap();
    // a non-empty directory where the header should go cannot be replaced
    fs::create_dir(&paths.header).unwrap();
    fs::write(paths.header.join("keep"), "").unwrap();

    let artifacts = transform(&document(MAIN), &GeneratorOptions::default()).unwrap();
    let err = artifacts.write(&paths).unwrap_err();

    match err {
      CmacsError::WriteFailed { path, .. } => assert_eq!(path, paths.header),
      other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
      fs::read_to_string(&paths.implementation).unwrap(),
      "// previous\n"
    );
  }

  #[test]
  fn test_namespace_overridden() {
    let source = format!("#pragma cmacs namespace First\n{}", document(MAIN));
    let artifacts = transform(&source, &GeneratorOptions::default()).unwrap();

    assert_eq!(
      artifacts.warnings,
      vec![Warning::NamespaceOverridden {
        previous: "First".to_string(),
        namespace: "App".to_string(),
        line: 2,
      }]
    );
    assert!(artifacts.header.contains("namespace App {"));
    assert!(!artifacts.header.contains("First"));
  }

  #[test]
  fn test_duplicate_class() {
    let source = format!(
      "{}#pragma cmacs class\nclass Other {{\n}};\n",
      document(MAIN)
    );
    let err = transform(&source, &GeneratorOptions::default()).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::DuplicateClass {
        line: 12,
        first_line: 3
      }
    ));
  }

  #[test]
  fn test_duplicate_destructor() {
    let source = document(&format!(
      "  #pragma cmacs destructor\n  ~Widget() {{}}\n  #pragma cmacs destructor\n  ~Widget() {{}}\n{}",
      MAIN
    ));
    let err = transform(&source, &GeneratorOptions::default()).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::DuplicateDestructor {
        line: 8,
        first_line: 6
      }
    ));
  }

  #[test]
  fn test_empty_class_body() {
    let err = transform(&document("  int x_;\n"), &GeneratorOptions::default()).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::EmptyClassBody { ref class, line: 3 } if class == "Widget"
    ));
  }

  #[test]
  fn test_malformed_directives() {
    let options = GeneratorOptions::default();

    let err = transform("#pragma cmacs cpp\nusing namespace std;\n", &options).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::MalformedDirective { ref tag, line: 1, .. } if tag == "cpp"
    ));

    let err = transform("\n#pragma cmacs namespace\n", &options).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::MalformedDirective { ref tag, line: 2, .. } if tag == "namespace"
    ));

    let err = transform("#pragma cmacs class\nenum Color {\n};\n", &options).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::MalformedDirective { ref tag, line: 1, .. } if tag == "class"
    ));
  }

  #[test]
  fn test_malformed_signatures() {
    let options = GeneratorOptions::default();

    let source = document(&format!("  #pragma cmacs constructor\n  Gadget() {{}}\n{}", MAIN));
    let err = transform(&source, &options).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::MalformedSignature { ref tag, line: 6, .. } if tag == "constructor"
    ));

    let source = document(&format!("  #pragma cmacs method\n  run() {{}}\n{}", MAIN));
    let err = transform(&source, &options).unwrap_err();
    assert!(matches!(
      err,
      CmacsError::MalformedSignature { ref tag, line: 6, .. } if tag == "method"
    ));
  }
}
