//! Source templates for the emitted build descriptors. Multi-line blocks are
//! pre-formatted in Rust and joined before rendering so that statement order
//! follows edge declaration order exactly.

pub const PYREQ_CONANFILE: &str = r#"from conan import ConanFile
from conan.tools.cmake import CMake, CMakeToolchain, cmake_layout
from conan.tools.env import VirtualBuildEnv


class LibraryBase:
    package_type = "library"
    implements = ["auto_shared_fpic", "auto_header_only"]
    settings = "os", "compiler", "build_type", "arch"
    options = {"shared": [True, False], "fPIC": [True, False]}
    default_options = {"shared": True, "fPIC": True}
    generators = ["CMakeDeps"]

    def layout(self):
        cmake_layout(self)

    def package_info(self):
        self.cpp_info.libs = [self.name]

    def generate(self):
        VirtualBuildEnv(self).generate()
        CMakeToolchain(self).generate()

    def build(self):
        cmake = CMake(self)
        cmake.configure()
        cmake.build()
        cmake.test()

    def package(self):
        cmake = CMake(self)
        cmake.configure()
        cmake.install()


class PyReq(ConanFile):
    name = "{{ name }}"
    version = "{{ version }}"
    package_type = "python-require"
"#;

pub const LIBRARY_CONANFILE: &str = r#"from conan import ConanFile


class LibraryRecipe(ConanFile):
    name = "{{ name }}"
    version = "{{ version }}"
    python_requires = "{{ pyreq_name }}/{{ pyreq_version }}"
    python_requires_extend = "{{ pyreq_name }}.LibraryBase"

    def requirements(self):
{{ requires_block }}        pass

    def build_requirements(self):
{{ test_requires_block }}        pass
"#;

pub const LIBRARY_CMAKE: &str = r#"cmake_minimum_required(VERSION 3.15)
project({{ name }})
{{ find_packages }}
add_library(${PROJECT_NAME} {{ name }}.cpp {{ name }}.hpp)
set_target_properties(${PROJECT_NAME} PROPERTIES CXX_VISIBILITY_PRESET hidden)
include(GenerateExportHeader)
generate_export_header(${PROJECT_NAME} EXPORT_MACRO_NAME {{ name }}_export)
target_include_directories(${PROJECT_NAME} PUBLIC "${PROJECT_BINARY_DIR}")
set_target_properties(${PROJECT_NAME} PROPERTIES PUBLIC_HEADER {{ name }}.hpp)
install(TARGETS ${PROJECT_NAME})
install(FILES "${PROJECT_BINARY_DIR}/${PROJECT_NAME}_export.h" TYPE INCLUDE)
target_link_libraries(${PROJECT_NAME} PUBLIC{{ link_targets }})

enable_testing()
add_executable(${PROJECT_NAME}_test ${PROJECT_NAME}_test.cpp)
target_link_libraries(${PROJECT_NAME}_test PRIVATE ${PROJECT_NAME}{{ test_link_targets }})
add_test(NAME ${PROJECT_NAME}_test COMMAND ${PROJECT_NAME}_test)
"#;

pub const LIBRARY_HEADER: &str = r#"#pragma once
{{ transitive_includes }}#include <{{ name }}_export.h>
#include <string>

namespace {{ name }} {

inline std::string probe_headers() {
    return std::string("{{ name }}"){{ header_probe_chain }};
}

std::string {{ name }}_export probe_link();

}
"#;

pub const LIBRARY_IMPL: &str = r#"#include "{{ name }}.hpp"
{{ private_includes }}
namespace {{ name }} {

std::string {{ name }}_export probe_link() {
    return std::string("{{ name }}"){{ link_probe_chain }};
}

}
"#;

pub const LIBRARY_TEST: &str = r#"#include "{{ name }}.hpp"
{{ test_includes }}
int main() {
    {{ name }}::probe_headers();
    {{ name }}::probe_link();
{{ test_probe_block }}    return 0;
}
"#;
