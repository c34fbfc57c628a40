//! Fixed C text placed ahead of the translated functions.

use crate::writer::CWriter;

const PRINT_HELPER: &str = r#"#ifdef _WIN32
static void print_utf8(const char *text)
{
    HANDLE out = GetStdHandle(STD_OUTPUT_HANDLE);
    DWORD mode;
    if (out != INVALID_HANDLE_VALUE && GetConsoleMode(out, &mode)) {
        int wide_len = MultiByteToWideChar(CP_UTF8, 0, text, -1, NULL, 0);
        wchar_t *wide = wide_len > 0 ? (wchar_t *)malloc(sizeof(wchar_t) * (size_t)wide_len) : NULL;
        if (wide != NULL) {
            DWORD written = 0;
            MultiByteToWideChar(CP_UTF8, 0, text, -1, wide, wide_len);
            WriteConsoleW(out, wide, (DWORD)(wide_len - 1), &written, NULL);
            WriteConsoleW(out, L"\n", 1, &written, NULL);
            free(wide);
            return;
        }
    }
    fputs(text, stdout);
    fputc('\n', stdout);
    fflush(stdout);
}
#else
static void print_utf8(const char *text)
{
    fputs(text, stdout);
    fputc('\n', stdout);
    fflush(stdout);
}
#endif
"#;

const RANDOM_HELPER: &str = r#"static int xf_random_between(int lo, int hi)
{
    unsigned long long span = (unsigned long long)((long long)hi - lo) + 1ULL;
    unsigned long long draw = (unsigned long long)rand() * ((unsigned long long)RAND_MAX + 1ULL)
        + (unsigned long long)rand();
    return (int)((long long)lo + (long long)(draw % span));
}
"#;

/// `#include` lines. `<time.h>` is only needed to seed `rand`.
pub fn write_headers(w: &mut CWriter, uses_random: bool) {
    w.line("#include <stdio.h>");
    w.line("#include <stdlib.h>");
    if uses_random {
        w.line("#include <time.h>");
    }
    w.line("#ifdef _WIN32");
    w.line("#include <windows.h>");
    w.line("#endif");
    w.blank();
}

pub fn write_helpers(w: &mut CWriter, uses_random: bool) {
    w.raw(PRINT_HELPER);
    w.blank();
    if uses_random {
        w.raw(RANDOM_HELPER);
        w.blank();
    }
}

/// `int main` calling `entry` once.
pub fn write_main(w: &mut CWriter, entry: &str, uses_random: bool) {
    w.open("int main(void)");
    w.line("#ifdef _WIN32");
    w.line("SetConsoleOutputCP(CP_UTF8);");
    w.line("#endif");
    if uses_random {
        w.line("srand((unsigned int)time(NULL));");
    }
    w.line(&format!("{}();", entry));
    w.line("return 0;");
    w.close();
}
